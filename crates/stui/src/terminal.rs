// SPDX-License-Identifier: MIT
//
// Terminal session control — raw mode, alternate screen, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd writes. These are the
// standard POSIX interfaces for terminal control; there is no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// A `Session` owns the terminal for its whole lifetime: it captures the
// original termios, applies raw attributes, switches to the alternate
// screen, and guarantees restoration on drop — even if the caller panics
// mid-frame. At most one session is live per process, enforced by an
// atomic guard: two sessions fighting over one controlling terminal
// cannot both restore it correctly.
//
// The raw attributes are deliberately narrow: canonical mode, echo, and
// signal keys off; output post-processing off; XON/XOFF and CR→NL
// translation off; 8-bit frames; and `VMIN = 0` / `VTIME = 1`, which
// turns every stdin read into a ~100ms bounded wait. That last pair is
// what makes `read_key` a poll instead of a block.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(unix)]
use std::sync::Mutex;
use std::sync::Once;

use crate::ansi;
use crate::input;
use crate::output::{CursorTracker, DrawBuffer};

/// Draw buffer capacity in bytes, fixed for the life of a session.
///
/// Matches stdio's BUFSIZ on the platforms this targets. Plenty for a
/// full frame of text plus escape sequences; anything larger spills
/// through the overflow protocol instead of growing.
pub const DRAW_BUF_CAPACITY: usize = 8192;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Session guard ──────────────────────────────────────────────────────────

/// Process-wide "a session is live" flag.
///
/// Exists solely to stop a second concurrent session from colliding over
/// the same controlling terminal; it is not a multi-session registry.
static SESSION_LIVE: AtomicBool = AtomicBool::new(false);

/// Token proving this process's single session slot is held.
///
/// Acquired first in [`Session::new`] and released when the session value
/// drops, so every early-error path releases it automatically.
struct SessionGuard;

impl SessionGuard {
    fn acquire() -> io::Result<Self> {
        if SESSION_LIVE
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Ok(Self)
        } else {
            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a terminal session is already live in this process",
            ))
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        SESSION_LIVE.store(false, Ordering::Release);
    }
}

// ─── Panic-safe terminal restore ────────────────────────────────────────────

/// Global backup of the original termios for panic recovery.
///
/// The [`Session`] owns its own copy, but the panic hook cannot reach it.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(backup) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *backup {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

#[cfg(unix)]
fn clear_termios_backup() {
    if let Ok(mut backup) = TERMIOS_BACKUP.lock() {
        *backup = None;
    }
}

#[cfg(not(unix))]
fn clear_termios_backup() {}

/// Restore sequence for emergency use: show the cursor, then exit the
/// alternate screen last so the restored shell content appears clean.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?25h\x1b[?1049l";

/// Panic hook guard — the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before the error prints.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the message. The hook writes
/// [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout lock,
/// which the panicking thread may hold), restores termios from the
/// backup, then delegates to the original handler.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence straight to stdout's file descriptor.
#[cfg(unix)]
fn emergency_restore() {
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }
}

#[cfg(not(unix))]
fn emergency_restore() {
    let _ = io::stdout().write_all(EMERGENCY_RESTORE);
    let _ = io::stdout().flush();
}

// ─── Raw mode (termios) ─────────────────────────────────────────────────────

/// Capture the current termios, apply the raw attributes, and return the
/// original for later restoration.
#[cfg(unix)]
fn enter_raw_mode() -> io::Result<libc::termios> {
    use std::os::unix::io::AsRawFd;

    let fd = io::stdin().as_raw_fd();

    unsafe {
        let mut original: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &raw mut original) != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut termios = original;
        termios.c_cflag |= libc::CS8;
        termios.c_iflag &= !(libc::IXON | libc::ICRNL);
        termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG);
        termios.c_oflag &= !libc::OPOST;
        // Bounded reads: return as soon as a byte is available, or after
        // one decisecond with none.
        termios.c_cc[libc::VMIN] = 0;
        termios.c_cc[libc::VTIME] = 1;

        if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(original)
    }
}

#[cfg(unix)]
fn restore_terminal_mode(original: &libc::termios) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let fd = io::stdin().as_raw_fd();
    unsafe {
        if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

// ─── Window size ────────────────────────────────────────────────────────────

/// Query the terminal size via `ioctl(TIOCGWINSZ)` on stdout.
///
/// A failed ioctl or a reported zero column count is an error: layout
/// against an unknown width is unsafe. A zero row count falls back to 24
/// (the historic default; the matching 80-column fallback is unreachable
/// because zero columns already failed).
#[cfg(unix)]
fn query_size() -> io::Result<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    if ws.ws_col == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "terminal reported a zero column count",
        ));
    }
    Ok(Size {
        cols: ws.ws_col,
        rows: if ws.ws_row == 0 { 24 } else { ws.ws_row },
    })
}

#[cfg(not(unix))]
fn query_size() -> io::Result<Size> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "window size queries require a unix terminal",
    ))
}

/// Write bytes to stdout immediately, bypassing the draw buffer.
fn write_direct(bytes: &[u8]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(bytes)?;
    out.flush()
}

// ─── Session ────────────────────────────────────────────────────────────────

/// A raw-mode alternate-screen terminal session.
///
/// Constructing a `Session` takes over the controlling terminal; dropping
/// it gives the terminal back. In between, draw operations accumulate in
/// the owned buffer until [`commit`](Self::commit) writes them out in a
/// single syscall.
///
/// # Example
///
/// ```no_run
/// use stui::terminal::Session;
/// use stui::text::prepare_line;
///
/// let mut session = Session::new()?;
/// let width = usize::from(session.size().cols);
/// session.draw_text(1, 1, &prepare_line(0, width, "hello"))?;
/// session.commit()?;
/// while session.read_key()?.is_none() {}
/// // Terminal restored automatically on drop.
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Session {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: libc::termios,

    /// Window size captured at entry (refresh with [`refresh_size`](Self::refresh_size)).
    size: Size,

    /// Last position a move sequence was emitted for.
    cursor: CursorTracker,

    /// Pending output bytes.
    buf: DrawBuffer,

    /// Whether raw mode and the alternate screen are currently held.
    active: bool,

    /// Process-wide single-session slot, released when this drops.
    _guard: SessionGuard,
}

impl Session {
    /// Take over the terminal: capture the original mode, apply raw
    /// attributes, enter the alternate screen, query the window size,
    /// and clear the screen.
    ///
    /// The clear is written immediately, bypassing the draw buffer, so
    /// the alternate screen starts blank before any commit.
    ///
    /// # Errors
    ///
    /// - [`io::ErrorKind::AlreadyExists`] if a session is already live
    ///   in this process.
    /// - The underlying error if stdin is not a terminal, raw attributes
    ///   cannot be applied, or the window size query fails. Whatever was
    ///   already applied is rolled back before the error returns.
    #[cfg(unix)]
    pub fn new() -> io::Result<Self> {
        let guard = SessionGuard::acquire()?;
        install_panic_hook();

        let original_termios = enter_raw_mode()?;
        if let Ok(mut backup) = TERMIOS_BACKUP.lock() {
            *backup = Some(original_termios);
        }

        if let Err(err) = write_direct(ansi::ENTER_ALT_SCREEN) {
            let _ = restore_terminal_mode(&original_termios);
            clear_termios_backup();
            return Err(err);
        }

        let size = match query_size() {
            Ok(size) => size,
            Err(err) => {
                let _ = write_direct(ansi::EXIT_ALT_SCREEN);
                let _ = restore_terminal_mode(&original_termios);
                clear_termios_backup();
                return Err(err);
            }
        };

        let mut session = Self {
            original_termios,
            size,
            cursor: CursorTracker::new(),
            buf: DrawBuffer::with_capacity(DRAW_BUF_CAPACITY),
            active: true,
            _guard: guard,
        };
        // Drop restores the terminal if even this first write fails.
        session.clear()?;
        Ok(session)
    }

    #[cfg(not(unix))]
    pub fn new() -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw terminal sessions require a unix terminal",
        ))
    }

    /// Window size captured at entry or at the last successful
    /// [`refresh_size`](Self::refresh_size).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Error for any operation attempted after [`leave`](Self::leave).
    fn ensure_active(&self) -> io::Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "terminal session is no longer active",
            ))
        }
    }

    /// Re-query the window size from the terminal.
    ///
    /// # Errors
    ///
    /// On query failure the session restores the terminal (best-effort
    /// [`leave`](Self::leave)) before returning the error: drawing
    /// against an unknown window size is unsafe for layout, so the
    /// session does not stay usable.
    pub fn refresh_size(&mut self) -> io::Result<Size> {
        self.ensure_active()?;
        match query_size() {
            Ok(size) => {
                self.size = size;
                Ok(size)
            }
            Err(err) => {
                let _ = self.leave();
                Err(err)
            }
        }
    }

    /// Whether raw mode and the alternate screen are currently held.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The last position the cursor was actually moved to, 1-indexed.
    #[inline]
    #[must_use]
    pub const fn cursor_position(&self) -> (u16, u16) {
        self.cursor.position()
    }

    /// Clear the whole screen, immediately and unbuffered.
    ///
    /// # Errors
    ///
    /// Returns an error if the write to stdout fails.
    pub fn clear(&mut self) -> io::Result<()> {
        self.ensure_active()?;
        write_direct(ansi::CLEAR_SCREEN)
    }

    /// Append the hide-cursor sequence to the draw buffer.
    ///
    /// # Errors
    ///
    /// Returns an error only if the append triggered an overflow commit
    /// and that write failed.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        self.ensure_active()?;
        let mut out = io::stdout().lock();
        self.buf.append(&mut out, ansi::CURSOR_HIDE)
    }

    /// Append the show-cursor sequence to the draw buffer.
    ///
    /// # Errors
    ///
    /// Returns an error only if the append triggered an overflow commit
    /// and that write failed.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        self.ensure_active()?;
        let mut out = io::stdout().lock();
        self.buf.append(&mut out, ansi::CURSOR_SHOW)
    }

    /// Move the cursor to `(x, y)`, 1-indexed, deduplicating repeats.
    ///
    /// A move to the recorded position appends nothing. Coordinates are
    /// not checked against the window size; the terminal clamps
    /// overshoot itself.
    ///
    /// # Errors
    ///
    /// Returns an error if an overflow commit fails; the recorded
    /// position is unchanged in that case.
    pub fn move_cursor(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.ensure_active()?;
        let mut out = io::stdout().lock();
        self.cursor.move_to(&mut self.buf, &mut out, x, y)
    }

    /// Draw `text` at `(x, y)` and return the cursor to where it was.
    ///
    /// All three steps (move, text, move back) go through the draw
    /// buffer; nothing appears until [`commit`](Self::commit). `text` is
    /// appended verbatim — pair with
    /// [`prepare_line`](crate::text::prepare_line) for fixed-width
    /// output.
    ///
    /// # Errors
    ///
    /// Returns an error if an overflow commit fails mid-append.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str) -> io::Result<()> {
        self.ensure_active()?;
        let mut out = io::stdout().lock();
        let (orig_x, orig_y) = self.cursor.position();
        self.cursor.move_to(&mut self.buf, &mut out, x, y)?;
        self.buf.append(&mut out, text.as_bytes())?;
        self.cursor.move_to(&mut self.buf, &mut out, orig_x, orig_y)
    }

    /// Write all buffered bytes to the terminal in one operation.
    ///
    /// After a successful commit the buffer is empty. Short writes are
    /// retried, never surfaced as partial output.
    ///
    /// # Errors
    ///
    /// Returns an error if the write to stdout fails.
    pub fn commit(&mut self) -> io::Result<()> {
        self.ensure_active()?;
        let mut out = io::stdout().lock();
        self.buf.commit(&mut out)
    }

    /// One bounded-wait read of a single keypress byte.
    ///
    /// `Ok(Some(byte))` if one arrived within the ~100ms raw-mode
    /// timeout, `Ok(None)` otherwise. Callers poll this in a loop.
    /// Escape sequences arrive one byte per call, undecoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails (interrupted reads
    /// are reported as `Ok(None)`, not errors) or the session is no
    /// longer active — a read outside raw mode would block on a full
    /// input line instead of timing out.
    pub fn read_key(&mut self) -> io::Result<Option<u8>> {
        self.ensure_active()?;
        input::read_byte()
    }

    /// Leave the alternate screen and restore the original terminal mode.
    ///
    /// Idempotent: calling `leave` on an already-restored session is a
    /// no-op. [`Drop`] calls this best-effort, so explicit use is only
    /// needed to observe restore errors. Buffered bytes that were never
    /// committed are discarded, not flushed.
    ///
    /// # Errors
    ///
    /// Returns the first error from the exit write or the termios
    /// restore; both are attempted regardless.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let screen = write_direct(ansi::EXIT_ALT_SCREEN);
        let mode = self.restore_mode();
        clear_termios_backup();
        screen.and(mode)
    }

    #[cfg(unix)]
    fn restore_mode(&self) -> io::Result<()> {
        restore_terminal_mode(&self.original_termios)
    }

    #[cfg(not(unix))]
    fn restore_mode(&self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

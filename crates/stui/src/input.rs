// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Key input: named key bytes and the bounded single-byte read.
//
// The read relies on the raw-mode settings a session applies at entry
// (`VMIN = 0`, `VTIME = 1`): a single `read()` of one byte returns as
// soon as a byte is available, or after ~100ms with nothing. There is
// no buffering and no escape-sequence decoding; an arrow key arrives
// as three separate reads. Multi-byte decoding is a separate feature
// this crate deliberately does not assume a scheme for.

#[cfg(unix)]
use std::io;

/// Backspace. DEL in the ASCII table, but terminals send it for Backspace.
pub const KEY_BACKSPACE: u8 = 127;

/// Carriage return, what the Enter key sends in raw mode.
pub const KEY_RETURN: u8 = 13;

/// Escape, also the first byte of every escape sequence.
pub const KEY_ESCAPE: u8 = 27;

/// Map a letter byte to its control-character equivalent.
///
/// `ctrl(b'q')` is the byte the terminal sends for Ctrl-Q. Works for
/// the classic control range (`@`, `a`–`z`, `[`, `\`, `]`, `^`, `_`).
#[inline]
#[must_use]
pub const fn ctrl(k: u8) -> u8 {
    k & 0x1f
}

/// One bounded-wait read of a single byte from stdin.
///
/// `Ok(Some(byte))` if a byte arrived within the raw-mode timeout,
/// `Ok(None)` if the timeout elapsed with nothing available or the read
/// was interrupted by a signal.
#[cfg(unix)]
pub(crate) fn read_byte() -> io::Result<Option<u8>> {
    read_byte_from(libc::STDIN_FILENO)
}

#[cfg(not(unix))]
pub(crate) fn read_byte() -> std::io::Result<Option<u8>> {
    Ok(None)
}

/// Read one byte from `fd`, mapping "nothing arrived" to `None`.
///
/// A zero-length read is how `VTIME` reports an expired timeout (and how
/// any descriptor reports EOF). `EINTR` also maps to `None`: a signal
/// during the wait means no byte, not an error the caller can act on.
#[cfg(unix)]
fn read_byte_from(fd: libc::c_int) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), 1) };
    match n {
        1 => Ok(Some(buf[0])),
        0 => Ok(None),
        _ => {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_key_values() {
        assert_eq!(KEY_BACKSPACE, 127);
        assert_eq!(KEY_RETURN, b'\r');
        assert_eq!(KEY_ESCAPE, 27);
    }

    #[test]
    fn ctrl_masks_to_control_range() {
        assert_eq!(ctrl(b'q'), 17);
        assert_eq!(ctrl(b'c'), 3);
        assert_eq!(ctrl(b'a'), 1);
        assert_eq!(ctrl(b'z'), 26);
    }

    #[test]
    fn ctrl_is_case_insensitive() {
        assert_eq!(ctrl(b'Q'), ctrl(b'q'));
    }

    #[test]
    fn ctrl_of_escape_bracket() {
        // Ctrl-[ is how Escape is typed on keyboards without the key.
        assert_eq!(ctrl(b'['), KEY_ESCAPE);
    }

    // ── read_byte_from, driven through a pipe ───────────────────────────
    //
    // Pipes have no VTIME, so these only exercise the paths that cannot
    // hang: byte available, EOF, and a bad descriptor.

    #[cfg(unix)]
    fn pipe_pair() -> (libc::c_int, libc::c_int) {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (fds[0], fds[1])
    }

    #[cfg(unix)]
    fn close(fd: libc::c_int) {
        unsafe {
            libc::close(fd);
        }
    }

    #[cfg(unix)]
    #[test]
    fn available_byte_is_returned() {
        let (read_fd, write_fd) = pipe_pair();
        let byte = b'x';
        let n = unsafe { libc::write(write_fd, std::ptr::from_ref(&byte).cast(), 1) };
        assert_eq!(n, 1);

        assert_eq!(read_byte_from(read_fd).unwrap(), Some(b'x'));

        close(read_fd);
        close(write_fd);
    }

    #[cfg(unix)]
    #[test]
    fn drained_stream_returns_none_not_stale_byte() {
        let (read_fd, write_fd) = pipe_pair();
        let byte = b'a';
        unsafe {
            libc::write(write_fd, std::ptr::from_ref(&byte).cast(), 1);
        }
        close(write_fd);

        // First read delivers the byte; the next must be None, never a
        // replay of the previous byte.
        assert_eq!(read_byte_from(read_fd).unwrap(), Some(b'a'));
        assert_eq!(read_byte_from(read_fd).unwrap(), None);
        assert_eq!(read_byte_from(read_fd).unwrap(), None);

        close(read_fd);
    }

    #[cfg(unix)]
    #[test]
    fn bad_descriptor_is_an_error() {
        assert!(read_byte_from(-1).is_err());
    }
}

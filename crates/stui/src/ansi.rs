// SPDX-License-Identifier: MIT
//
// ANSI escape sequence encoding.
//
// The byte-level wire contract lives here and nowhere else: fixed
// sequences as named constants, plus the one parameterized emitter
// (cursor positioning). No state, no decisions about when to emit —
// `output` and `terminal` own that.
//
// All cursor positions in this crate are 1-indexed, matching the ANSI
// CUP convention: `(1, 1)` is the top-left cell.

use std::io::{self, Write};

// ─── Fixed sequences ────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Enter the alternate screen buffer (DEC Private Mode 1049).
///
/// The alternate screen is a separate buffer that preserves the original
/// terminal content, restored when the session exits.
pub const ENTER_ALT_SCREEN: &[u8] = b"\x1b[?1049h";

/// Exit the alternate screen buffer and restore original content.
pub const EXIT_ALT_SCREEN: &[u8] = b"\x1b[?1049l";

/// Hide the cursor (DECTCEM reset).
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Show the cursor (DECTCEM set).
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

// ─── Cursor ─────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// `x` is the column, `y` the row, both 1-indexed. CUP takes the row
/// parameter first: `ESC [ y ; x H`. Coordinates are not range-checked;
/// the terminal clamps out-of-range requests itself.
///
/// # Errors
///
/// Propagates errors from the underlying writer. Never fails when the
/// writer is a `Vec<u8>`.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{y};{x}H")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: run an ANSI emitter and return its output as a string.
    fn emit<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cursor_to_origin() {
        assert_eq!(emit(|w| cursor_to(w, 1, 1)), "\x1b[1;1H");
    }

    #[test]
    fn cursor_to_row_before_column() {
        // CUP is row-first: x=10, y=20 encodes as 20;10.
        assert_eq!(emit(|w| cursor_to(w, 10, 20)), "\x1b[20;10H");
    }

    #[test]
    fn cursor_to_max() {
        let s = emit(|w| cursor_to(w, 1000, 500));
        assert_eq!(s, "\x1b[500;1000H");
    }

    #[test]
    fn clear_screen_sequence() {
        assert_eq!(CLEAR_SCREEN, b"\x1b[2J");
    }

    #[test]
    fn alt_screen_sequences() {
        assert_eq!(ENTER_ALT_SCREEN, b"\x1b[?1049h");
        assert_eq!(EXIT_ALT_SCREEN, b"\x1b[?1049l");
    }

    #[test]
    fn cursor_visibility_sequences() {
        assert_eq!(CURSOR_HIDE, b"\x1b[?25l");
        assert_eq!(CURSOR_SHOW, b"\x1b[?25h");
    }
}

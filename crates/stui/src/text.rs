// SPDX-License-Identifier: MIT
//
// Fixed-width line formatting.
//
// `prepare_line` renders a string into a line of exactly `width` terminal
// cells: leading padding, the text (truncated to fit), trailing padding.
// Width is measured in cells over grapheme clusters, so CJK and emoji
// count as two cells and a combining mark stays attached to its base.
// For ASCII input this degenerates to a plain per-character count.
//
// Newlines never survive into the output: a line is a line.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Format `text` into a line of exactly `width` terminal cells.
///
/// Cells `[0, offset)` are spaces, then graphemes of `text` fill the line
/// until the next one would no longer fit, and any remaining cells are
/// spaces. A newline inside the copied region becomes a single space
/// (`"\r\n"` is one grapheme cluster and also becomes one space).
///
/// Edge cases:
/// - `offset >= width` yields `width` spaces.
/// - `text` wider than `width - offset` is silently truncated; a wide
///   grapheme that would straddle the end is dropped and padded over.
/// - `width == 0` yields an empty string.
/// - Zero-width clusters (stray controls, lone combining marks) are
///   dropped so the cell count stays exact.
#[must_use]
pub fn prepare_line(offset: usize, width: usize, text: &str) -> String {
    let mut line = String::with_capacity(width);
    let lead = offset.min(width);
    for _ in 0..lead {
        line.push(' ');
    }

    let avail = width - lead;
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        if used == avail {
            break;
        }
        // Check before the width lookup: newline clusters measure zero
        // cells but must still consume one as a space.
        if grapheme.contains('\n') {
            line.push(' ');
            used += 1;
            continue;
        }
        let cells = grapheme.width();
        if cells == 0 {
            continue;
        }
        if used + cells > avail {
            break;
        }
        line.push_str(grapheme);
        used += cells;
    }

    for _ in used..avail {
        line.push(' ');
    }
    line
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use unicode_width::UnicodeWidthStr;

    use super::*;

    #[test]
    fn plain_text_padded_to_width() {
        assert_eq!(prepare_line(0, 8, "hi"), "hi      ");
    }

    #[test]
    fn offset_prepends_spaces() {
        assert_eq!(prepare_line(3, 8, "hi"), "   hi   ");
    }

    #[test]
    fn newline_becomes_space() {
        // 2 spaces of offset, "hi", newline replaced by a space,
        // truncated at width 6.
        assert_eq!(prepare_line(2, 6, "hi\nyo"), "  hi y");
    }

    #[test]
    fn crlf_is_one_space() {
        assert_eq!(prepare_line(0, 5, "a\r\nb"), "a b  ");
    }

    #[test]
    fn overlong_text_truncated() {
        assert_eq!(prepare_line(0, 4, "abcdefgh"), "abcd");
    }

    #[test]
    fn offset_eats_into_available_width() {
        assert_eq!(prepare_line(2, 4, "abcdefgh"), "  ab");
    }

    #[test]
    fn offset_at_width_is_blank_line() {
        assert_eq!(prepare_line(6, 6, "hidden"), "      ");
    }

    #[test]
    fn offset_past_width_is_blank_line() {
        assert_eq!(prepare_line(10, 4, "hidden"), "    ");
    }

    #[test]
    fn zero_width_is_empty() {
        assert_eq!(prepare_line(0, 0, "anything"), "");
        assert_eq!(prepare_line(5, 0, "anything"), "");
    }

    #[test]
    fn empty_text_is_all_spaces() {
        assert_eq!(prepare_line(0, 4, ""), "    ");
        assert_eq!(prepare_line(2, 4, ""), "    ");
    }

    #[test]
    fn output_always_exactly_width_cells() {
        for offset in 0..10 {
            for width in 0..12 {
                for text in ["", "x", "hello world", "a\nb\nc", "日本語", "héllo"] {
                    let line = prepare_line(offset, width, text);
                    assert_eq!(
                        line.width(),
                        width,
                        "offset={offset} width={width} text={text:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn leading_cells_are_spaces() {
        for offset in 0..6 {
            let line = prepare_line(offset, 8, "text");
            let lead: String = line.chars().take(offset).collect();
            assert_eq!(lead, " ".repeat(offset));
        }
    }

    #[test]
    fn no_newline_survives() {
        for text in ["\n", "a\nb", "\n\n\n", "end\n", "\nstart"] {
            let line = prepare_line(0, 10, text);
            assert!(!line.contains('\n'), "newline leaked from {text:?}");
        }
    }

    #[test]
    fn wide_chars_count_two_cells() {
        // Each CJK char is two cells: four cells of text, no padding.
        assert_eq!(prepare_line(0, 4, "日本"), "日本");
        // Only two cells available: second char is truncated.
        assert_eq!(prepare_line(0, 2, "日本"), "日");
    }

    #[test]
    fn straddling_wide_char_dropped_and_padded() {
        // Three cells: the second two-cell char does not fit, so the
        // last cell pads with a space.
        assert_eq!(prepare_line(0, 3, "日本"), "日 ");
    }

    #[test]
    fn combining_mark_stays_with_base() {
        // "e" + U+0301 is one grapheme, one cell.
        let line = prepare_line(0, 3, "e\u{301}x");
        assert_eq!(line.width(), 3);
        assert!(line.starts_with("e\u{301}"));
    }

    #[test]
    fn truncation_is_prefix_only() {
        // Once a grapheme fails to fit, nothing after it is copied, even
        // if a later narrow char would fit in the leftover cell.
        assert_eq!(prepare_line(0, 3, "日本a"), "日 ");
    }
}

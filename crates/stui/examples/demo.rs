// SPDX-License-Identifier: MIT
//
// stui demo — a keypress viewer that proves every primitive works together.
//
// This wires the complete pipeline: Session → prepare_line → draw_text →
// commit → read_key poll. Run it, press keys, watch them land in the log.
// Press q or Ctrl-Q to quit.
//
// Usage:
//   cargo run -p stui --example demo

use std::collections::VecDeque;
use std::io;

use stui::input::{ctrl, KEY_BACKSPACE, KEY_ESCAPE, KEY_RETURN};
use stui::terminal::Session;
use stui::text::prepare_line;

/// Maximum number of keypresses kept in the scrolling log.
const MAX_LOG_ENTRIES: usize = 64;

/// Describe a keypress byte for the log.
fn describe(key: u8) -> String {
    match key {
        KEY_RETURN => "Return".into(),
        KEY_ESCAPE => "Escape (or the start of an escape sequence)".into(),
        KEY_BACKSPACE => "Backspace".into(),
        1..=26 => format!("Ctrl-{}", (b'a' + key - 1) as char),
        k if k.is_ascii_graphic() || k == b' ' => format!("'{}'", k as char),
        k => format!("byte {k}"),
    }
}

fn main() -> io::Result<()> {
    let mut session = Session::new()?;
    let size = session.size();
    let width = usize::from(size.cols);

    session.hide_cursor()?;

    let mut log: VecDeque<String> = VecDeque::with_capacity(MAX_LOG_ENTRIES);
    let mut count: u64 = 0;

    loop {
        let header = format!(
            "stui demo | {}x{} | {count} keys | q or Ctrl-Q quits",
            size.cols, size.rows
        );
        session.draw_text(1, 1, &prepare_line(1, width, &header))?;
        session.draw_text(1, 2, &prepare_line(0, width, ""))?;

        // Newest entry at the top, one row per entry.
        let mut y: u16 = 3;
        for entry in log.iter().rev() {
            if y > size.rows {
                break;
            }
            session.draw_text(1, y, &prepare_line(1, width, entry))?;
            y += 1;
        }
        session.commit()?;

        match session.read_key()? {
            None => {} // Timeout: poll again.
            Some(b'q') => break,
            Some(k) if k == ctrl(b'q') => break,
            Some(key) => {
                count += 1;
                if log.len() == MAX_LOG_ENTRIES {
                    log.pop_front();
                }
                log.push_back(format!("{count:>4}  {}", describe(key)));
            }
        }
    }

    session.show_cursor()?;
    session.commit()?;
    session.leave()
}

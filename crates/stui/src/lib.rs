// SPDX-License-Identifier: MIT
//
// stui — minimal terminal UI primitives.
//
// Four concerns, and only four: a raw-mode alternate-screen session with
// guaranteed restoration, a fixed-capacity draw buffer committed in
// single writes, cursor-move deduplication, and fixed-width line
// formatting, plus a bounded single-byte key read to poll input.
//
// This crate intentionally avoids TUI frameworks (ratatui, crossterm)
// in favor of direct terminal control via ANSI escape sequences and raw
// termios. Every byte sent to the terminal is accounted for; every
// escape code is earned. What it deliberately does not do: widgets,
// colors and attributes, escape-sequence key decoding, resize events
// (size is an on-demand query), or any asynchronous I/O.

pub mod ansi;
pub mod input;
pub mod output;
pub mod terminal;
pub mod text;

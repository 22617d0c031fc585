//! Monochrome 128x64 screen: drawing primitives and the layouts drawn with
//! them.

mod canvas;
mod terminal;

pub use canvas::Canvas;
pub use terminal::TerminalDisplay;

use std::time::Duration;

use crate::engine::TransportStatus;
use crate::menu::{Level, MenuView};

pub const WIDTH: i32 = 128;
pub const HEIGHT: i32 = 64;
pub const FONT_WIDTH: i32 = 7;
pub const FONT_HEIGHT: i32 = 10;
/// Characters that fit across the screen.
pub const LINE_CHARS: usize = (WIDTH / FONT_WIDTH) as usize;

/// Drawing surface. Nothing is visible until `refresh`.
pub trait Display {
    fn clear(&mut self);
    /// Outline from (x0, y0) to (x1, y1), both inclusive.
    fn draw_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, on: bool);
    fn draw_pixel(&mut self, x: i32, y: i32, on: bool);
    /// Text with its top-left corner at (x, y). Inverted text is drawn dark
    /// on a lit background.
    fn write_text(&mut self, x: i32, y: i32, text: &str, inverted: bool);
    fn refresh(&mut self);
}

/// Everything the device draws, over any [`Display`].
pub struct Screen {
    display: Box<dyn Display>,
    message_scale: f32,
}

impl Screen {
    pub fn new(display: Box<dyn Display>, message_scale: f32) -> Self {
        Screen {
            display,
            message_scale: message_scale.max(0.0),
        }
    }

    /// Full-screen message, kept up for `hold` (scaled) before returning.
    pub fn show_message(&mut self, text: &str, hold: Duration) {
        self.display.clear();
        let rows = (20..HEIGHT).step_by(FONT_HEIGHT as usize);
        for (line, y) in wrap(text, LINE_CHARS).into_iter().zip(rows) {
            self.display.write_text(0, y, line, false);
        }
        self.display.refresh();

        let wait = hold.mul_f32(self.message_scale);
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }

    pub fn draw_menu(&mut self, view: &MenuView<'_>, status: &TransportStatus) {
        self.display.clear();

        let pitch = match view.level {
            Level::Main | Level::Submenu => 15,
            Level::FileSelect => 12,
        };
        for (row, index) in view.rows().enumerate() {
            let y = 10 + row as i32 * pitch;
            let label = view.items.label(index);
            if index == view.selected {
                self.highlight(y, label);
                self.display.write_text(5, y, label, true);
            } else {
                self.display.write_text(5, y, label, false);
            }
        }

        self.status_line(status);
        self.display.refresh();
    }

    /// Rewrite only the transport line.
    pub fn draw_status(&mut self, status: &TransportStatus) {
        self.status_line(status);
        self.display.refresh();
    }

    fn status_line(&mut self, status: &TransportStatus) {
        // Blank the line first, the display keeps whatever was there.
        self.display.write_text(0, 50, "                    ", false);
        self.display.write_text(0, 50, status_for(status), false);
    }

    fn highlight(&mut self, y: i32, label: &str) {
        let width = label.chars().count() as i32 * FONT_WIDTH + 6;
        self.display.draw_rect(2, y - 2, width, y + FONT_HEIGHT, true);
        for x in 3..width {
            for y in (y - 1)..(y + FONT_HEIGHT - 1) {
                self.display.draw_pixel(x, y, true);
            }
        }
    }
}

/// Break `text` at spaces into lines of at most `width` characters. A word
/// longer than a line is split.
fn wrap(text: &str, width: usize) -> Vec<&str> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut rest = text.trim();
    while let Some((limit, next)) = rest.char_indices().nth(width) {
        // A space right after the last fitting character is a clean break too.
        let cut = rest[..limit + next.len_utf8()]
            .rfind(' ')
            .filter(|cut| *cut > 0)
            .unwrap_or(limit);
        lines.push(rest[..cut].trim_end());
        rest = rest[cut..].trim_start();
    }
    lines.push(rest);
    lines
}

fn status_for(status: &TransportStatus) -> &'static str {
    if status.recording {
        "Recording..."
    } else if status.playing {
        "Playing..."
    } else {
        "Stopped..."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Mode;
    use crate::menu::{Items, MAIN_ENTRIES};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Text(i32, i32, String, bool),
        Refresh,
    }

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<Op>>>);

    impl Display for Recorder {
        fn clear(&mut self) {
            self.0.borrow_mut().push(Op::Clear);
        }
        fn draw_rect(&mut self, _: i32, _: i32, _: i32, _: i32, _: bool) {}
        fn draw_pixel(&mut self, _: i32, _: i32, _: bool) {}
        fn write_text(&mut self, x: i32, y: i32, text: &str, inverted: bool) {
            self.0.borrow_mut().push(Op::Text(x, y, text.to_string(), inverted));
        }
        fn refresh(&mut self) {
            self.0.borrow_mut().push(Op::Refresh);
        }
    }

    fn stopped() -> TransportStatus {
        TransportStatus {
            mode: Mode::Empty,
            playing: false,
            recording: false,
            length: 0,
            write_head: 0,
        }
    }

    #[test]
    fn message_clears_writes_and_refreshes() {
        let recorder = Recorder::default();
        let mut screen = Screen::new(Box::new(recorder.clone()), 0.0);
        screen.show_message("Saving...", Duration::from_secs(5));
        assert_eq!(
            *recorder.0.borrow(),
            [Op::Clear, Op::Text(0, 20, "Saving...".into(), false), Op::Refresh]
        );
    }

    #[test]
    fn long_message_wraps_at_words() {
        let recorder = Recorder::default();
        let mut screen = Screen::new(Box::new(recorder.clone()), 0.0);
        screen.show_message("No Binary Files Found", Duration::ZERO);
        assert_eq!(
            *recorder.0.borrow(),
            [
                Op::Clear,
                Op::Text(0, 20, "No Binary Files".into(), false),
                Op::Text(0, 30, "Found".into(), false),
                Op::Refresh,
            ]
        );
    }

    #[test]
    fn wrap_splits_words_longer_than_a_line() {
        assert_eq!(wrap("Saved LOOP10.BIN", LINE_CHARS), ["Saved LOOP10.BIN"]);
        assert_eq!(wrap("abcdefghij", 4), ["abcd", "efgh", "ij"]);
        assert_eq!(wrap("ab cd ef", 5), ["ab cd", "ef"]);
    }

    #[test]
    fn selected_row_is_inverted() {
        let recorder = Recorder::default();
        let mut screen = Screen::new(Box::new(recorder.clone()), 0.0);
        let view = MenuView {
            level: Level::Main,
            items: Items::Labels(&MAIN_ENTRIES),
            selected: 1,
            first: 0,
            visible: 3,
        };
        screen.draw_menu(&view, &stopped());

        let ops = recorder.0.borrow();
        assert_eq!(ops.first(), Some(&Op::Clear));
        assert!(ops.contains(&Op::Text(5, 10, "Save/Recall".into(), false)));
        assert!(ops.contains(&Op::Text(5, 25, "Loop/Playback".into(), true)));
        assert!(ops.contains(&Op::Text(5, 40, "Settings".into(), false)));
        assert!(ops.contains(&Op::Text(0, 50, "Stopped...".into(), false)));
        assert_eq!(ops.last(), Some(&Op::Refresh));
        assert_eq!(ops.iter().filter(|op| **op == Op::Refresh).count(), 1);
    }

    #[test]
    fn status_text_follows_transport() {
        let mut status = stopped();
        assert_eq!(status_for(&status), "Stopped...");
        status.playing = true;
        assert_eq!(status_for(&status), "Playing...");
        status.recording = true;
        assert_eq!(status_for(&status), "Recording...");
    }
}

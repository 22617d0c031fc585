use ratatui::DefaultTerminal;

use super::{Canvas, Display};

/// [`Canvas`] shown in the terminal; each `refresh` draws one frame.
pub struct TerminalDisplay {
    terminal: DefaultTerminal,
    canvas: Canvas,
}

impl TerminalDisplay {
    pub fn new(terminal: DefaultTerminal) -> Self {
        TerminalDisplay {
            terminal,
            canvas: Canvas::new(),
        }
    }
}

impl Display for TerminalDisplay {
    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn draw_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, on: bool) {
        self.canvas.draw_rect(x0, y0, x1, y1, on);
    }

    fn draw_pixel(&mut self, x: i32, y: i32, on: bool) {
        self.canvas.draw_pixel(x, y, on);
    }

    fn write_text(&mut self, x: i32, y: i32, text: &str, inverted: bool) {
        self.canvas.write_text(x, y, text, inverted);
    }

    fn refresh(&mut self) {
        let canvas = &self.canvas;
        if let Err(e) = self
            .terminal
            .draw(|frame| frame.render_widget(canvas, frame.area()))
        {
            log::warn!("terminal draw failed: {e}");
        }
    }
}

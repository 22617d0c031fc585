use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style, Styled, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Widget},
};

use super::{Display, FONT_WIDTH, HEIGHT, WIDTH};

/// Pixel rows covered by one terminal row.
const ROW_HEIGHT: i32 = 8;
pub const COLUMNS: usize = ((WIDTH + FONT_WIDTH - 1) / FONT_WIDTH) as usize;
pub const ROWS: usize = (HEIGHT / ROW_HEIGHT) as usize;

#[derive(Debug, Clone, Copy)]
struct Glyph {
    ch: char,
    inverted: bool,
}

/// In-memory 128x64 frame, rendered as a ratatui widget with one terminal
/// cell per `FONT_WIDTH` x `ROW_HEIGHT` pixel block.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: Box<[bool]>,
    glyphs: Box<[Option<Glyph>]>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Canvas {
            pixels: vec![false; (WIDTH * HEIGHT) as usize].into_boxed_slice(),
            glyphs: vec![None; COLUMNS * ROWS].into_boxed_slice(),
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> bool {
        (0..WIDTH).contains(&x) && (0..HEIGHT).contains(&y) && self.pixels[(y * WIDTH + x) as usize]
    }

    /// Text of one terminal row, blanks for empty cells.
    pub fn row_text(&self, row: usize) -> String {
        (0..COLUMNS)
            .map(|col| self.glyph(col, row).map_or(' ', |g| g.ch))
            .collect()
    }

    fn glyph(&self, col: usize, row: usize) -> Option<Glyph> {
        self.glyphs.get(row * COLUMNS + col).copied().flatten()
    }

    /// A cell is lit when the pixel at its center is.
    fn lit(&self, col: usize, row: usize) -> bool {
        let x = col as i32 * FONT_WIDTH + FONT_WIDTH / 2;
        let y = row as i32 * ROW_HEIGHT + ROW_HEIGHT / 2;
        self.pixel(x, y)
    }

    fn cell(&self, col: usize, row: usize) -> Span<'static> {
        let glyph = self.glyph(col, row);
        let ch = glyph.map_or(' ', |g| g.ch);
        let inverted = glyph.is_some_and(|g| g.inverted);
        let style = match (self.lit(col, row), inverted) {
            (true, _) => Style::new().fg(Color::Black).bg(Color::White),
            (false, true) => Style::new().reversed(),
            (false, false) => Style::new(),
        };
        Span::styled(ch.to_string(), style)
    }
}

impl Display for Canvas {
    fn clear(&mut self) {
        self.pixels.fill(false);
        self.glyphs.fill(None);
    }

    fn draw_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, on: bool) {
        for x in x0..=x1 {
            self.draw_pixel(x, y0, on);
            self.draw_pixel(x, y1, on);
        }
        for y in y0..=y1 {
            self.draw_pixel(x0, y, on);
            self.draw_pixel(x1, y, on);
        }
    }

    fn draw_pixel(&mut self, x: i32, y: i32, on: bool) {
        if (0..WIDTH).contains(&x) && (0..HEIGHT).contains(&y) {
            self.pixels[(y * WIDTH + x) as usize] = on;
        }
    }

    fn write_text(&mut self, x: i32, y: i32, text: &str, inverted: bool) {
        if !(0..HEIGHT).contains(&y) || x < 0 {
            return;
        }
        let row = (y / ROW_HEIGHT) as usize;
        let first = (x / FONT_WIDTH) as usize;
        for (offset, ch) in text.chars().enumerate() {
            let col = first + offset;
            if col >= COLUMNS {
                break;
            }
            self.glyphs[row * COLUMNS + col] = Some(Glyph { ch, inverted });
        }
    }

    fn refresh(&mut self) {}
}

impl Widget for &Canvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(vec![
            " SD ".bold(),
            "LOOP".set_style(Color::Rgb(26, 153, 136)).bold().italic(),
            "ER ".bold(),
        ]);
        let instructions = Line::from(vec![
            " Menu ".into(),
            "<Arrows/Enter>".blue().bold(),
            " Play ".into(),
            "<P>".blue().bold(),
            " Rec ".into(),
            "<R>".blue().bold(),
            " Mix ".into(),
            "<[ ]>".blue().bold(),
            " Reset ".into(),
            "<hold X>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let lines: Vec<Line> = (0..ROWS)
            .map(|row| Line::from((0..COLUMNS).map(|col| self.cell(col, row)).collect::<Vec<_>>()))
            .collect();

        Paragraph::new(Text::from(lines))
            .block(block)
            .render(area, buf);
    }
}

/// Frame buffer primitives for the diff renderer: cells, a 2D grid with
/// text and box drawing helpers, rectangles, and RGB colour math.
///
/// Text width follows Unicode East Asian width, so CJK titles and emoji
/// take two columns: the left cell holds the glyph, the right one is a
/// continuation cell the flusher skips.

use crossterm::style::Color;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::domain::confetti::Rgb;

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    ch: [u8; 16],   // up to 16 bytes (covers ZWJ emoji sequences)
    ch_len: u8,
    pub fg: Color,
    pub bg: Color,
    pub wide: bool, // occupies 2 terminal columns
    pub cont: bool, // right half of a wide glyph (not printed)
}

impl Cell {
    /// Explicit background for every "empty" cell, matching the clear
    /// colour so VTE terminals show no seams between rows.
    pub const BASE_BG: Color = Color::Rgb { r: 15, g: 15, b: 17 };

    pub const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    /// Sentinel that differs from every real cell; forces a full repaint.
    pub const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn glyph(c: char, fg: Color, bg: Color, wide: bool) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = bg;
        cell.wide = wide;
        cell
    }

    fn continuation(bg: Color) -> Self {
        Cell { ch: [0; 16], ch_len: 0, fg: Color::White, bg, wide: false, cont: true }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── Rect ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Rect { x, y, w, h }
    }

    /// A `w`×`h` rect centered in `outer`, clamped to fit.
    pub fn centered_in(outer: Rect, w: usize, h: usize) -> Self {
        let w = w.min(outer.w);
        let h = h.min(outer.h);
        Rect { x: outer.x + (outer.w - w) / 2, y: outer.y + (outer.h - h) / 2, w, h }
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        col >= self.x && col < self.x + self.w && row >= self.y && row < self.y + self.h
    }

    pub fn right(&self) -> usize {
        self.x + self.w
    }

    pub fn bottom(&self) -> usize {
        self.y + self.h
    }
}

// ── Colour math ──

pub fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

fn channels(c: Color) -> (u8, u8, u8) {
    match c {
        Color::Rgb { r, g, b } => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    }
}

/// Linear blend: `t = 0` gives `a`, `t = 1` gives `b`.
pub fn lerp(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (ar, ag, ab) = channels(a);
    let (br, bg, bb) = channels(b);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color::Rgb { r: mix(ar, br), g: mix(ag, bg), b: mix(ab, bb) }
}

/// Darken toward black; `keep = 0.2` leaves a fifth of the brightness.
pub fn dim(c: Color, keep: f32) -> Color {
    lerp(Color::Rgb { r: 0, g: 0, b: 0 }, c, keep)
}

pub fn str_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

// ── FrameBuffer ──

pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    pub fn bg_at(&self, x: usize, y: usize) -> Color {
        self.get(x, y).bg
    }

    pub fn fill_rect(&mut self, r: Rect, bg: Color) {
        for y in r.y..r.bottom().min(self.height) {
            for x in r.x..r.right().min(self.width) {
                self.set(x, y, Cell::glyph(' ', Color::White, bg, false));
            }
        }
    }

    /// Write `s` at (x, y). `bg: None` keeps the background already there.
    /// Stops at the right edge; a wide glyph that would straddle it is
    /// dropped. Returns the columns written.
    pub fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Option<Color>) -> usize {
        if y >= self.height { return 0; }
        let mut cx = x;
        for ch in s.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if w == 0 { continue; }
            if cx + w > self.width { break; }
            let cell_bg = bg.unwrap_or_else(|| self.bg_at(cx, y));
            if w == 2 {
                self.set(cx, y, Cell::glyph(ch, fg, cell_bg, true));
                let next_bg = bg.unwrap_or_else(|| self.bg_at(cx + 1, y));
                self.set(cx + 1, y, Cell::continuation(next_bg));
            } else {
                self.set(cx, y, Cell::glyph(ch, fg, cell_bg, false));
            }
            cx += w;
        }
        cx - x
    }

    /// Center `s` horizontally within `[x0, x0 + w)`.
    pub fn put_centered(&mut self, x0: usize, w: usize, y: usize, s: &str, fg: Color, bg: Option<Color>) {
        let sw = str_width(s);
        let x = x0 + w.saturating_sub(sw) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    /// Single glyph, keeping the background. Wide glyphs need two columns.
    pub fn put_char(&mut self, x: usize, y: usize, ch: char, fg: Color) {
        let mut buf = [0u8; 4];
        self.put_str(x, y, ch.encode_utf8(&mut buf), fg, None);
    }

    /// Rounded border around `r`, drawn on top of whatever is there.
    pub fn draw_border(&mut self, r: Rect, fg: Color) {
        if r.w < 2 || r.h < 2 { return; }
        let (x1, y1) = (r.right() - 1, r.bottom() - 1);
        for x in r.x + 1..x1 {
            self.put_char(x, r.y, '─', fg);
            self.put_char(x, y1, '─', fg);
        }
        for y in r.y + 1..y1 {
            self.put_char(r.x, y, '│', fg);
            self.put_char(x1, y, '│', fg);
        }
        self.put_char(r.x, r.y, '╭', fg);
        self.put_char(x1, r.y, '╮', fg);
        self.put_char(r.x, y1, '╰', fg);
        self.put_char(x1, y1, '╯', fg);
    }

    /// Darken every cell (modal backdrop).
    pub fn dim_all(&mut self, keep: f32) {
        for cell in &mut self.cells {
            cell.fg = dim(cell.fg, keep);
            cell.bg = dim(cell.bg, keep);
        }
    }
}

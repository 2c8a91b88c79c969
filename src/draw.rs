// Window + software drawing utilities.
// 1) A window that shows the booth (preview, frame strip, dialogs).
// 2) Keyboard/mouse edges the frame loop turns into handler calls.
// 3) Rect fills/outlines, nearest-neighbour blits, and a tiny 5x7 bitmap font.

use crate::error::Error;
use crate::types::{FrameBuffer, blend_over};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,
    mouse_was_down: bool, // for click edges; minifb only reports "is down"
}

impl Drawer {
    /// Create a window of the given size.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        // keeps the loop from spinning when no camera paces it
        window.set_target_fps(60);
        Ok(Self { window, mouse_was_down: false })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    pub fn shutter_pressed(&self) -> bool {
        self.pressed(Key::Space)
    }

    pub fn save_pressed(&self) -> bool {
        self.pressed(Key::S) || self.pressed(Key::Enter)
    }

    pub fn close_pressed(&self) -> bool {
        self.pressed(Key::X)
    }

    pub fn escape_pressed(&self) -> bool {
        self.pressed(Key::Escape)
    }

    /// 0-based frame index for a number key 1..9 pressed this frame.
    pub fn digit_pressed(&self) -> Option<usize> {
        const DIGITS: [Key; 9] = [
            Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5,
            Key::Key6, Key::Key7, Key::Key8, Key::Key9,
        ];
        DIGITS.iter().position(|&k| self.pressed(k))
    }

    /// Mouse position in window pixels, `None` when outside the window.
    pub fn mouse_pos(&self) -> Option<(usize, usize)> {
        self.window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| (x.max(0.0) as usize, y.max(0.0) as usize))
    }

    /// Position of a left click that started this frame.
    pub fn clicked_at(&mut self) -> Option<(usize, usize)> {
        let down = self.window.get_mouse_down(MouseButton::Left);
        let edge = down && !self.mouse_was_down;
        self.mouse_was_down = down;
        if edge { self.mouse_pos() } else { None }
    }
}

/* ---------- Software drawing ---------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: usize, py: usize) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.w && py < self.y + self.h
    }

    /// Same rect grown by `by` pixels on every side (clamped at 0).
    pub fn inflate(&self, by: usize) -> Rect {
        let x = self.x.saturating_sub(by);
        let y = self.y.saturating_sub(by);
        Rect::new(x, y, self.x + self.w + by - x, self.y + self.h + by - y)
    }
}

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

pub fn fill_rect(fb: &mut FrameBuffer, r: Rect, color: u32) {
    let x1 = (r.x + r.w).min(fb.width);
    let y1 = (r.y + r.h).min(fb.height);
    for y in r.y.min(y1)..y1 {
        let row = y * fb.width;
        fb.pixels[row + r.x.min(x1)..row + x1].fill(color);
    }
}

/// 1..n pixel outline just inside `r`.
pub fn stroke_rect(fb: &mut FrameBuffer, r: Rect, thickness: usize, color: u32) {
    let t = thickness.min(r.w / 2).min(r.h / 2).max(1);
    fill_rect(fb, Rect::new(r.x, r.y, r.w, t), color);
    fill_rect(fb, Rect::new(r.x, r.y + r.h.saturating_sub(t), r.w, t), color);
    fill_rect(fb, Rect::new(r.x, r.y, t, r.h), color);
    fill_rect(fb, Rect::new(r.x + r.w.saturating_sub(t), r.y, t, r.h), color);
}

/// Darken every pixel to `keep`/256 of its brightness (modal backdrop).
pub fn dim(fb: &mut FrameBuffer, keep: u32) {
    for p in fb.pixels.iter_mut() {
        let r = ((*p >> 16) & 0xFF) * keep / 256;
        let g = ((*p >> 8) & 0xFF) * keep / 256;
        let b = (*p & 0xFF) * keep / 256;
        *p = 0xFF_00_00_00 | (r << 16) | (g << 8) | b;
    }
}

/// Stretch `src` into `dst_rect` (nearest neighbour), source-over.
/// Cheap enough to run on the live preview every frame.
pub fn blit_scaled(dst: &mut FrameBuffer, src: &FrameBuffer, r: Rect) {
    if src.width == 0 || src.height == 0 || r.w == 0 || r.h == 0 {
        return;
    }
    let x1 = (r.x + r.w).min(dst.width);
    let y1 = (r.y + r.h).min(dst.height);
    for y in r.y..y1 {
        let sy = (y - r.y) * src.height / r.h;
        let srow = sy * src.width;
        let drow = y * dst.width;
        for x in r.x..x1 {
            let sx = (x - r.x) * src.width / r.w;
            let d = &mut dst.pixels[drow + x];
            *d = blend_over(*d, src.pixels[srow + sx]);
        }
    }
}

/* ---------- 5x7 bitmap font (uppercase ASCII, digits, a little punctuation) ---------- */

/// Return a 5x7 glyph bitmap.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),

        _ => None,
    }
}

/// Draw a single glyph at (x,y), each font pixel a `scale`x`scale` block,
/// with a 1-block black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (pass_color, off) in [(0xFF_00_00_00u32, scale), (color, 0)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) == 0 {
                    continue;
                }
                let px = x + rx * scale + off;
                let py = y + ry as i32 * scale + off;
                for dy in 0..scale {
                    for dx in 0..scale {
                        put_pixel(fb, px + dx, py + dy, pass_color);
                    }
                }
            }
        }
    }
}

/// Pixel width of `text` at `scale` (5 px glyph + 1 px spacing).
pub fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 6 * scale
}

/// Draw a text string using 5x7 glyphs at `scale`.
pub fn draw_text(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: usize) {
    let scale = scale.max(1) as i32;
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color, scale);
        x += 6 * scale;
    }
}

/// Single-scale HUD text.
pub fn draw_text_5x7(fb: &mut FrameBuffer, x: i32, y: i32, text: &str, color: u32) {
    draw_text(fb, x, y, text, color, 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::opaque;

    #[test]
    fn fill_rect_clips_to_buffer() {
        let mut fb = FrameBuffer::new(4, 4);
        fill_rect(&mut fb, Rect::new(2, 2, 10, 10), opaque(0xFF0000));
        assert_eq!(fb.pixel(3, 3), opaque(0xFF0000));
        assert_eq!(fb.pixel(1, 1), 0);
        fill_rect(&mut fb, Rect::new(9, 9, 3, 3), opaque(0x00FF00));
    }

    #[test]
    fn stroke_rect_leaves_inside() {
        let mut fb = FrameBuffer::new(6, 6);
        stroke_rect(&mut fb, Rect::new(0, 0, 6, 6), 1, opaque(0xFFFFFF));
        assert_eq!(fb.pixel(0, 3), opaque(0xFFFFFF));
        assert_eq!(fb.pixel(5, 5), opaque(0xFFFFFF));
        assert_eq!(fb.pixel(2, 2), 0);
    }

    #[test]
    fn blit_scaled_covers_target_rect() {
        let src = FrameBuffer::filled(2, 2, opaque(0x0000FF));
        let mut dst = FrameBuffer::new(10, 10);
        blit_scaled(&mut dst, &src, Rect::new(2, 3, 5, 4));
        assert_eq!(dst.pixel(2, 3), opaque(0x0000FF));
        assert_eq!(dst.pixel(6, 6), opaque(0x0000FF));
        assert_eq!(dst.pixel(7, 6), 0);
        assert_eq!(dst.pixel(2, 7), 0);
    }

    #[test]
    fn rect_hit_test_and_inflate() {
        let r = Rect::new(10, 10, 5, 5);
        assert!(r.contains(10, 14));
        assert!(!r.contains(15, 10));
        assert_eq!(r.inflate(3), Rect::new(7, 7, 11, 11));
        assert_eq!(Rect::new(1, 1, 2, 2).inflate(3), Rect::new(0, 0, 6, 6));
    }

    #[test]
    fn text_draws_known_glyphs_only() {
        let mut fb = FrameBuffer::new(40, 10);
        draw_text_5x7(&mut fb, 0, 0, "~~~", opaque(0xFFFFFF));
        assert!(fb.is_blank());
        draw_text_5x7(&mut fb, 0, 0, "save", opaque(0xFFFFFF));
        assert!(fb.pixels.contains(&opaque(0xFFFFFF)));
        assert_eq!(text_width("SAVE", 2), 48);
    }

    #[test]
    fn dim_darkens_and_makes_opaque() {
        let mut fb = FrameBuffer::filled(1, 1, opaque(0xFF8040));
        dim(&mut fb, 128);
        assert_eq!(fb.pixel(0, 0), opaque(0x7F4020));
    }
}

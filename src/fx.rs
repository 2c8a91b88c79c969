// Shutter flash: the preview goes white the instant the photo is taken and
// fades back while the result dialog is on its way.

use crate::draw::Rect;
use crate::types::FrameBuffer;

/// Additive blend one RGB triplet into the pixel at `idx` with saturation to 255.
#[inline]
fn add_rgb_saturating(fb: &mut FrameBuffer, idx: usize, r: u8, g: u8, b: u8) {
    let old = fb.pixels[idx];

    let or = ((old >> 16) & 0xFF) as u16;
    let og = ((old >> 8) & 0xFF) as u16;
    let ob = (old & 0xFF) as u16;

    let nr = (or + r as u16).min(255) as u32;
    let ng = (og + g as u16).min(255) as u32;
    let nb = (ob + b as u16).min(255) as u32;

    fb.pixels[idx] = 0xFF_00_00_00 | (nr << 16) | (ng << 8) | nb;
}

/// Brightness of the flash for reveal progress `t` in [0,1]:
/// full white at the shot, eased out to nothing when the dialog opens.
pub fn flash_strength(t: f32) -> f32 {
    let left = 1.0 - t.clamp(0.0, 1.0);
    left * left
}

/// Add white light of `strength` in [0,1] over `area`.
pub fn flash(fb: &mut FrameBuffer, area: Rect, strength: f32) {
    let v = (255.0 * strength.clamp(0.0, 1.0)).round() as u8;
    if v == 0 {
        return;
    }
    let x1 = (area.x + area.w).min(fb.width);
    let y1 = (area.y + area.h).min(fb.height);
    for y in area.y..y1 {
        for x in area.x..x1 {
            add_rgb_saturating(fb, y * fb.width + x, v, v, v);
        }
    }
}

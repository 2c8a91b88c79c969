// Core drawing surface shared by preview, overlay, snapshot and result.

use image::{RgbaImage, imageops::FilterType};

/// Fully transparent pixel; what a freshly cleared canvas holds.
pub const TRANSPARENT: u32 = 0x00_00_00_00;

/// A canvas of 0xAARRGGBB pixels. minifb ignores the top byte, so a buffer
/// can be presented as-is; the compositor honours it for overlay cut-outs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // canvas width (pixels), fixed after setup
    pub height: usize,     // canvas height (pixels), fixed after setup
    pub pixels: Vec<u32>,  // row-major, length = width * height
}

impl FrameBuffer {
    /// A transparent canvas of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![TRANSPARENT; width * height] }
    }

    /// A canvas filled with one colour.
    #[cfg(test)]
    pub fn filled(width: usize, height: usize, argb: u32) -> Self {
        Self { width, height, pixels: vec![argb; width * height] }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(TRANSPARENT);
    }

    /// True while nothing has been drawn since the last clear.
    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == TRANSPARENT)
    }

    /// Copy into an `image` RGBA buffer (straight alpha).
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut raw = Vec::with_capacity(self.pixels.len() * 4);
        for &p in &self.pixels {
            let [a, r, g, b] = p.to_be_bytes();
            raw.extend_from_slice(&[r, g, b, a]);
        }
        // length always matches width*height*4
        RgbaImage::from_raw(self.width as u32, self.height as u32, raw)
            .unwrap_or_else(|| RgbaImage::new(self.width as u32, self.height as u32))
    }

    /// Build a canvas from an RGBA image, one pixel per pixel.
    #[cfg(test)]
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| pack_argb(p[3], p[0], p[1], p[2]))
            .collect();
        Self { width: w as usize, height: h as usize, pixels }
    }

    /// Draw `img` stretched to this canvas's size, source-over.
    /// Same as a 2D context `drawImage(img, 0, 0, width, height)`.
    pub fn draw_image_scaled(&mut self, img: &RgbaImage) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (w, h) = (self.width as u32, self.height as u32);
        let scaled;
        let src = if img.dimensions() == (w, h) {
            img
        } else {
            scaled = image::imageops::resize(img, w, h, FilterType::Triangle);
            &scaled
        };
        for (dst, p) in self.pixels.iter_mut().zip(src.pixels()) {
            *dst = blend_over(*dst, pack_argb(p[3], p[0], p[1], p[2]));
        }
    }

    /// Draw another canvas stretched to this one, source-over.
    pub fn draw_canvas_scaled(&mut self, src: &FrameBuffer) {
        if src.width == self.width && src.height == self.height {
            for (dst, &s) in self.pixels.iter_mut().zip(&src.pixels) {
                *dst = blend_over(*dst, s);
            }
        } else {
            self.draw_image_scaled(&src.to_rgba_image());
        }
    }
}

#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    u32::from_be_bytes([a, r, g, b])
}

/// Opaque colour from 0xRRGGBB.
#[inline]
pub fn opaque(rgb: u32) -> u32 {
    0xFF_00_00_00 | (rgb & 0x00_FF_FF_FF)
}

/// Porter-Duff source-over with straight (non-premultiplied) alpha.
#[inline]
pub fn blend_over(dst: u32, src: u32) -> u32 {
    let sa = src >> 24;
    if sa == 0xFF {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst >> 24;
    let out_a = sa + (da * (255 - sa) + 127) / 255;
    if out_a == 0 {
        return TRANSPARENT;
    }
    let den = out_a * 255;
    let channel = |shift: u32| {
        let sc = (src >> shift) & 0xFF;
        let dc = (dst >> shift) & 0xFF;
        let num = sc * sa * 255 + dc * da * (255 - sa);
        ((num + den / 2) / den).min(255)
    };
    (out_a.min(255) << 24) | (channel(16) << 16) | (channel(8) << 8) | channel(0)
}

// Flattens canvases onto a destination, first to last.
//
// Each source is rasterized to PNG and decoded again before it is drawn, so
// every draw sees a settled, fixed-size image rather than a canvas that may
// still change underneath it.

use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::error::Error;
use crate::types::FrameBuffer;

/// Draw every source onto `dest`, scaled to `dest`'s size, in order
/// (later sources land on top). Stops at the first source that fails to
/// round-trip; whatever was drawn before that stays drawn.
pub fn concat_canvas(dest: &mut FrameBuffer, sources: &[&FrameBuffer]) -> Result<(), Error> {
    for (i, src) in sources.iter().enumerate() {
        let image = image_from_canvas(src).map_err(|e| {
            log::warn!("compositing stopped at source {i}: {e}");
            e
        })?;
        dest.draw_image_scaled(&image);
    }
    Ok(())
}

/// Canvas -> PNG bytes -> decoded RGBA image.
pub fn image_from_canvas(src: &FrameBuffer) -> Result<RgbaImage, Error> {
    let bytes = encode_png(src)?;
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .map_err(|e| Error::Decode(format!("canvas image: {e}")))?;
    Ok(decoded.to_rgba8())
}

pub fn encode_png(src: &FrameBuffer) -> Result<Vec<u8>, Error> {
    if src.width == 0 || src.height == 0 {
        return Err(Error::Encode(format!("empty canvas {}x{}", src.width, src.height)));
    }
    let mut out = Cursor::new(Vec::new());
    src.to_rgba_image()
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::Encode(format!("png: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TRANSPARENT, opaque, pack_argb};
    use proptest::prelude::*;

    /// Opaque border one pixel wide, transparent inside, like a photo frame.
    fn frame_canvas(w: usize, h: usize, color: u32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    fb.pixels[y * w + x] = color;
                }
            }
        }
        fb
    }

    #[test]
    fn overlay_lands_on_top_of_snapshot() {
        let snapshot = FrameBuffer::filled(6, 4, opaque(0x336699));
        let overlay = frame_canvas(6, 4, opaque(0xFFD700));
        let mut result = FrameBuffer::new(6, 4);

        concat_canvas(&mut result, &[&snapshot, &overlay]).unwrap();

        assert_eq!(result.pixel(0, 0), opaque(0xFFD700));
        assert_eq!(result.pixel(5, 3), opaque(0xFFD700));
        assert_eq!(result.pixel(2, 2), opaque(0x336699));
    }

    #[test]
    fn order_matters() {
        let a = FrameBuffer::filled(2, 2, opaque(0xFF0000));
        let b = FrameBuffer::filled(2, 2, opaque(0x0000FF));
        let mut ab = FrameBuffer::new(2, 2);
        let mut ba = FrameBuffer::new(2, 2);
        concat_canvas(&mut ab, &[&a, &b]).unwrap();
        concat_canvas(&mut ba, &[&b, &a]).unwrap();
        assert_eq!(ab.pixel(1, 1), opaque(0x0000FF));
        assert_eq!(ba.pixel(1, 1), opaque(0xFF0000));
    }

    #[test]
    fn sources_scale_to_destination() {
        let small = FrameBuffer::filled(3, 2, opaque(0x204060));
        let mut result = FrameBuffer::new(12, 8);
        concat_canvas(&mut result, &[&small]).unwrap();
        assert!(result.pixels.iter().all(|&p| p == opaque(0x204060)));
    }

    #[test]
    fn failing_source_keeps_earlier_draws() {
        let good = FrameBuffer::filled(2, 2, opaque(0x00FF00));
        let broken = FrameBuffer::new(0, 0);
        let mut result = FrameBuffer::new(2, 2);

        let err = concat_canvas(&mut result, &[&good, &broken]).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert!(result.pixels.iter().all(|&p| p == opaque(0x00FF00)));
    }

    #[test]
    fn empty_source_list_is_noop() {
        let mut result = FrameBuffer::filled(2, 2, opaque(0x010203));
        concat_canvas(&mut result, &[]).unwrap();
        assert!(result.pixels.iter().all(|&p| p == opaque(0x010203)));
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_pixels(
            w in 1usize..6,
            h in 1usize..6,
            seed in any::<u32>(),
        ) {
            let mut fb = FrameBuffer::new(w, h);
            let mut s = seed | 1;
            for p in fb.pixels.iter_mut() {
                s ^= s << 13; s ^= s >> 17; s ^= s << 5;
                *p = s;
            }
            let img = image_from_canvas(&fb).unwrap();
            prop_assert_eq!(FrameBuffer::from_rgba_image(&img), fb);
        }

        #[test]
        fn opaque_overlay_always_wins(
            under in any::<u32>(),
            over in 0u32..0x0100_0000,
        ) {
            let snapshot = FrameBuffer::filled(3, 3, under);
            let overlay = FrameBuffer::filled(3, 3, opaque(over));
            let mut result = FrameBuffer::new(3, 3);
            concat_canvas(&mut result, &[&snapshot, &overlay]).unwrap();
            prop_assert!(result.pixels.iter().all(|&p| p == opaque(over)));
        }

        #[test]
        fn transparent_overlay_shows_snapshot(rgb in 0u32..0x0100_0000) {
            let snapshot = FrameBuffer::filled(3, 3, opaque(rgb));
            let overlay = FrameBuffer::filled(3, 3, TRANSPARENT);
            let mut result = FrameBuffer::new(3, 3);
            concat_canvas(&mut result, &[&snapshot, &overlay]).unwrap();
            prop_assert!(result.pixels.iter().all(|&p| p == pack_argb(0xFF, (rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)));
        }
    }
}

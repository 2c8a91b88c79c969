// Canvas -> image file.
//
// A canvas is first turned into a `data:` URL, exactly what a browser's
// `toDataURL` produces, and the URL is then unpacked into raw bytes plus
// the MIME type it declares. The bytes land on disk under the download name.

use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use log::{debug, info};

use crate::error::Error;
use crate::types::FrameBuffer;

pub const DEFAULT_MIME: &str = "image/png";
pub const DEFAULT_FILENAME: &str = "photo";

/// Encoded image bytes and the MIME type they are encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// MIME type -> encoder. Anything we cannot encode falls back to PNG.
fn format_for(mime: &str) -> (ImageFormat, &'static str) {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => (ImageFormat::Jpeg, "image/jpeg"),
        "image/bmp" => (ImageFormat::Bmp, "image/bmp"),
        "image/png" => (ImageFormat::Png, "image/png"),
        other => {
            debug!("unsupported export type {other:?}, using {DEFAULT_MIME}");
            (ImageFormat::Png, DEFAULT_MIME)
        }
    }
}

/// `data:<mime>;base64,<payload>` for the canvas.
pub fn canvas_to_data_url(canvas: &FrameBuffer, mime: &str) -> Result<String, Error> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(Error::Encode(format!("empty canvas {}x{}", canvas.width, canvas.height)));
    }
    let (format, mime) = format_for(mime);
    // JPEG has no alpha: transparent areas come out black.
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(flatten_on_black(canvas)),
        _ => DynamicImage::ImageRgba8(canvas.to_rgba_image()),
    };

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .map_err(|e| Error::Encode(format!("{mime}: {e}")))?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(out.into_inner())))
}

fn flatten_on_black(canvas: &FrameBuffer) -> image::RgbImage {
    let mut img = image::RgbImage::new(canvas.width as u32, canvas.height as u32);
    for (dst, &p) in img.pixels_mut().zip(&canvas.pixels) {
        let [a, r, g, b] = p.to_be_bytes();
        let scale = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
        *dst = image::Rgb([scale(r), scale(g), scale(b)]);
    }
    img
}

/// Unpack a base64 `data:` URL into its bytes and declared MIME type.
pub fn blob_from_data_url(url: &str) -> Result<Blob, Error> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| Error::Decode("data URL without ',' separator".into()))?;
    let meta = header
        .strip_prefix("data:")
        .ok_or_else(|| Error::Decode(format!("not a data URL: {header:?}")))?;
    let mime = meta.split(';').next().unwrap_or_default();
    if mime.is_empty() {
        return Err(Error::Decode("data URL without a MIME type".into()));
    }
    if !meta.split(';').any(|p| p == "base64") {
        return Err(Error::Decode("data URL is not base64 encoded".into()));
    }
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::Decode(format!("base64 payload: {e}")))?;
    Ok(Blob { bytes, mime: mime.to_string() })
}

/// The canvas as raw image bytes of (at most) the requested type.
pub fn blob_from_canvas(canvas: &FrameBuffer, mime: &str) -> Result<Blob, Error> {
    blob_from_data_url(&canvas_to_data_url(canvas, mime)?)
}

/// Save the canvas into `dir` as `filename`. An existing file is never
/// replaced: `photo (1)`, `photo (2)`, ... are tried instead. Returns the path
/// actually written.
pub fn canvas_download(
    canvas: &FrameBuffer,
    mime: &str,
    filename: &str,
    dir: &Path,
) -> Result<PathBuf, Error> {
    let blob = blob_from_canvas(canvas, mime)?;
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Export(format!("create {}: {e}", dir.display())))?;

    for n in 0u32.. {
        let path = dir.join(numbered(filename, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&blob.bytes)
                    .map_err(|e| Error::Export(format!("write {}: {e}", path.display())))?;
                info!("saved {} ({} bytes, {})", path.display(), blob.bytes.len(), blob.mime);
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(Error::Export(format!("open {}: {e}", path.display()))),
        }
    }
    Err(Error::Export(format!("no free name for {filename:?}")))
}

/// `photo`, `photo (1)`, `photo (2)`; keeps any extension at the end.
fn numbered(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{filename} ({n})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{opaque, pack_argb};

    fn sample_canvas() -> FrameBuffer {
        let mut fb = FrameBuffer::new(5, 4);
        for (i, p) in fb.pixels.iter_mut().enumerate() {
            *p = pack_argb(if i % 3 == 0 { 0 } else { 0xFF }, i as u8 * 10, 200, 255 - i as u8);
        }
        fb
    }

    #[test]
    fn data_url_has_png_header() {
        let url = canvas_to_data_url(&sample_canvas(), "image/png").unwrap();
        assert!(url.starts_with("data:image/png;base64,iVBORw0K"), "{}", &url[..40]);
    }

    #[test]
    fn blob_bytes_are_decoded_not_text() {
        let blob = blob_from_canvas(&sample_canvas(), DEFAULT_MIME).unwrap();
        assert_eq!(blob.mime, "image/png");
        assert_eq!(&blob.bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn png_export_roundtrips_pixels() {
        let canvas = sample_canvas();
        let blob = blob_from_canvas(&canvas, "image/png").unwrap();
        let decoded = image::load_from_memory(&blob.bytes).unwrap().to_rgba8();
        assert_eq!(FrameBuffer::from_rgba_image(&decoded), canvas);
    }

    #[test]
    fn untouched_canvas_exports_valid_blank_png() {
        let blank = FrameBuffer::new(640, 480);
        let blob = blob_from_canvas(&blank, DEFAULT_MIME).unwrap();
        assert_eq!(blob.mime, DEFAULT_MIME);
        let decoded = image::load_from_memory_with_format(&blob.bytes, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.dimensions(), (640, 480));
        assert!(decoded.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn jpeg_flattens_alpha_and_reports_mime() {
        let mut canvas = FrameBuffer::filled(8, 8, opaque(0xFFFFFF));
        canvas.pixels[0] = 0; // transparent corner
        let blob = blob_from_canvas(&canvas, "image/jpeg").unwrap();
        assert_eq!(blob.mime, "image/jpeg");
        assert_eq!(&blob.bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&blob.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn unknown_mime_falls_back_to_png() {
        let blob = blob_from_canvas(&sample_canvas(), "image/webp-ish").unwrap();
        assert_eq!(blob.mime, "image/png");
    }

    #[test]
    fn malformed_data_urls_rejected() {
        assert!(matches!(blob_from_data_url("nonsense"), Err(Error::Decode(_))));
        assert!(matches!(blob_from_data_url("http://x,abc"), Err(Error::Decode(_))));
        assert!(matches!(blob_from_data_url("data:image/png,abc"), Err(Error::Decode(_))));
        assert!(matches!(blob_from_data_url("data:image/png;base64,@@@"), Err(Error::Decode(_))));
    }

    #[test]
    fn download_writes_photo_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = sample_canvas();
        let path = canvas_download(&canvas, DEFAULT_MIME, DEFAULT_FILENAME, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("photo"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, blob_from_canvas(&canvas, DEFAULT_MIME).unwrap().bytes);
    }

    #[test]
    fn download_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = FrameBuffer::filled(2, 2, opaque(0x123456));
        let first = canvas_download(&canvas, DEFAULT_MIME, "photo", dir.path()).unwrap();
        let second = canvas_download(&canvas, DEFAULT_MIME, "photo", dir.path()).unwrap();
        let third = canvas_download(&canvas, DEFAULT_MIME, "shot.png", dir.path()).unwrap();
        let fourth = canvas_download(&canvas, DEFAULT_MIME, "shot.png", dir.path()).unwrap();
        assert_eq!(first.file_name().unwrap(), "photo");
        assert_eq!(second.file_name().unwrap(), "photo (1)");
        assert_eq!(third.file_name().unwrap(), "shot.png");
        assert_eq!(fourth.file_name().unwrap(), "shot (1).png");
    }
}

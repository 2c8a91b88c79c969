// Opens the requested camera and converts frames into canvas pixels.
// `Preview` is the live view: it owns whatever source got bound (if any),
// and holds the last frame so a paused preview keeps showing it.

use crate::config::{CaptureConfig, Facing};
use crate::error::Error;
use crate::types::{FrameBuffer, pack_argb};

use log::{debug, info, warn};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
};

/// Anything that can hand us live frames. The camera in production,
/// a scripted source in tests.
pub trait FrameSource {
    /// Next frame, blocking until one is ready.
    fn next_frame(&mut self) -> Result<FrameBuffer, Error>;
    /// Resolution the source actually delivers.
    fn resolution(&self) -> (u32, u32);
}

// A small wrapper around nokhwa::Camera so the frame loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open the camera described by `cfg` (closest format to the requested size).
    /// One attempt only; the caller decides what a failure means.
    pub fn open(cfg: &CaptureConfig) -> Result<Self, Error> {
        let index = match cfg.camera_index {
            Some(i) => i,
            None => select_by_facing(cfg.facing),
        };
        if cfg.audio {
            warn!("audio capture requested but not supported; continuing video-only");
        }

        let fmt = CameraFormat::new(
            Resolution::new(cfg.width, cfg.height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("Create camera {index}: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        info!("camera {index} streaming at {}x{}", actual.width(), actual.height());

        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }
}

impl FrameSource for CameraCapture {
    fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        // Camera pixels are always opaque.
        let (w, h) = rgb_img.dimensions();
        let pixels = rgb_img
            .pixels()
            .map(|p| pack_argb(0xFF, p[0], p[1], p[2]))
            .collect();

        Ok(FrameBuffer { width: w as usize, height: h as usize, pixels })
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Ask the OS for its cameras and pick one whose name matches `facing`.
/// Falls back to device 0 when nothing matches or the query fails.
fn select_by_facing(facing: Facing) -> u32 {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(list) => {
            let devices: Vec<(u32, String)> = list
                .iter()
                .filter_map(|info| match info.index() {
                    CameraIndex::Index(i) => Some((*i, info.human_name())),
                    CameraIndex::String(_) => None,
                })
                .collect();
            debug!("cameras: {devices:?}");
            pick_index(&devices, facing)
        }
        Err(e) => {
            warn!("camera query failed ({e}); using device 0");
            0
        }
    }
}

/// Name-based guess; laptops and phones label their cameras fairly consistently.
pub fn pick_index(devices: &[(u32, String)], facing: Facing) -> u32 {
    let hints: &[&str] = match facing {
        Facing::User => &["front", "user", "integrated", "facetime", "built-in"],
        Facing::Environment => &["back", "rear", "environment", "world"],
    };
    devices
        .iter()
        .find(|(_, name)| {
            let name = name.to_lowercase();
            hints.iter().any(|h| name.contains(h))
        })
        .or_else(|| devices.first())
        .map(|(i, _)| *i)
        .unwrap_or(0)
}

/// Consecutive bad frames before the camera is given up on.
pub const MAX_FRAME_FAILURES: u32 = 30;

/// The live preview surface. Unbound when the camera could not be opened;
/// an unbound preview stays blank and never errors.
pub struct Preview {
    source: Option<Box<dyn FrameSource>>,
    frame: FrameBuffer,
    playing: bool,
    failures: u32, // consecutive next_frame errors
}

impl Preview {
    pub fn bound(source: Box<dyn FrameSource>) -> Self {
        let (w, h) = source.resolution();
        Self { source: Some(source), frame: FrameBuffer::new(w as usize, h as usize), playing: true, failures: 0 }
    }

    pub fn unbound(width: usize, height: usize) -> Self {
        Self { source: None, frame: FrameBuffer::new(width, height), playing: false, failures: 0 }
    }

    /// Open the camera once. Failure is logged as `name: message` and
    /// leaves the preview unbound; there is no retry.
    pub fn connect(cfg: &CaptureConfig) -> Self {
        match CameraCapture::open(cfg) {
            Ok(cam) => Self::bound(Box::new(cam)),
            Err(e) => {
                log::error!("{}: {}", e.name(), e);
                Self::unbound(cfg.width as usize, cfg.height as usize)
            }
        }
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Resume playback. No-op for an unbound preview.
    pub fn play(&mut self) {
        self.playing = self.source.is_some();
    }

    /// Pull one frame while playing. A paused or unbound preview keeps
    /// its current frame, and so does a failed grab. After
    /// `MAX_FRAME_FAILURES` failures in a row the camera is dropped and the
    /// preview stays on its last frame.
    pub fn pump(&mut self) -> Result<(), Error> {
        if !self.playing {
            return Ok(());
        }
        let Some(src) = self.source.as_mut() else {
            return Ok(());
        };
        match src.next_frame() {
            Ok(frame) => {
                self.frame = frame;
                self.failures = 0;
                Ok(())
            }
            Err(e) => {
                self.failures += 1;
                if self.failures >= MAX_FRAME_FAILURES {
                    log::error!("camera lost after {} failed frames; preview frozen", self.failures);
                    self.source = None;
                    self.playing = false;
                }
                Err(e)
            }
        }
    }

    /// What the preview is showing right now.
    pub fn current(&self) -> &FrameBuffer {
        &self.frame
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::opaque;

    /// Emits solid frames, cycling through `colors`.
    pub struct ScriptedSource {
        pub width: u32,
        pub height: u32,
        pub colors: Vec<u32>,
        pub next: usize,
    }

    impl ScriptedSource {
        pub fn new(width: u32, height: u32, colors: Vec<u32>) -> Self {
            Self { width, height, colors, next: 0 }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
            let c = self.colors[self.next % self.colors.len()];
            self.next += 1;
            Ok(FrameBuffer::filled(self.width as usize, self.height as usize, c))
        }

        fn resolution(&self) -> (u32, u32) {
            (self.width, self.height)
        }
    }

    #[test]
    fn facing_prefers_matching_name() {
        let devices = vec![
            (0, "USB Rear Camera".to_string()),
            (3, "Integrated Webcam".to_string()),
        ];
        assert_eq!(pick_index(&devices, Facing::User), 3);
        assert_eq!(pick_index(&devices, Facing::Environment), 0);
    }

    #[test]
    fn facing_falls_back_to_first_then_zero() {
        let devices = vec![(5, "Logitech C920".to_string())];
        assert_eq!(pick_index(&devices, Facing::User), 5);
        assert_eq!(pick_index(&[], Facing::User), 0);
    }

    #[test]
    fn paused_preview_holds_frame() {
        let src = ScriptedSource::new(4, 4, vec![opaque(0xFF0000), opaque(0x00FF00)]);
        let mut preview = Preview::bound(Box::new(src));
        preview.pump().unwrap();
        assert_eq!(preview.current().pixel(0, 0), opaque(0xFF0000));

        preview.pause();
        preview.pump().unwrap();
        assert_eq!(preview.current().pixel(0, 0), opaque(0xFF0000));

        preview.play();
        preview.pump().unwrap();
        assert_eq!(preview.current().pixel(0, 0), opaque(0x00FF00));
    }

    /// Good frames first, then nothing but errors.
    struct DyingSource {
        good: usize,
    }

    impl FrameSource for DyingSource {
        fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
            if self.good == 0 {
                return Err(Error::CameraFrame("device unplugged".into()));
            }
            self.good -= 1;
            Ok(FrameBuffer::filled(4, 4, opaque(0x00FF00)))
        }

        fn resolution(&self) -> (u32, u32) {
            (4, 4)
        }
    }

    #[test]
    fn failed_grab_keeps_last_frame_then_unbinds() {
        let mut preview = Preview::bound(Box::new(DyingSource { good: 1 }));
        preview.pump().unwrap();

        for _ in 1..MAX_FRAME_FAILURES {
            assert!(matches!(preview.pump(), Err(Error::CameraFrame(_))));
            assert!(preview.is_bound());
        }
        assert!(preview.pump().is_err());
        assert!(!preview.is_bound());
        assert!(!preview.is_playing());
        assert_eq!(preview.current().pixel(0, 0), opaque(0x00FF00));

        // nothing left to fail
        preview.play();
        preview.pump().unwrap();
    }

    #[test]
    fn good_frame_resets_failure_count() {
        struct Flaky {
            n: u32,
        }
        impl FrameSource for Flaky {
            fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
                self.n += 1;
                if self.n % MAX_FRAME_FAILURES == 0 {
                    Ok(FrameBuffer::filled(2, 2, opaque(0x0000FF)))
                } else {
                    Err(Error::CameraFrame("dropped frame".into()))
                }
            }
            fn resolution(&self) -> (u32, u32) {
                (2, 2)
            }
        }

        let mut preview = Preview::bound(Box::new(Flaky { n: 0 }));
        for _ in 0..3 * MAX_FRAME_FAILURES {
            let _ = preview.pump();
        }
        assert!(preview.is_bound());
        assert_eq!(preview.current().pixel(0, 0), opaque(0x0000FF));
    }

    #[test]
    fn missing_camera_leaves_preview_unbound() {
        let cfg = CaptureConfig { camera_index: Some(9_999), ..CaptureConfig::default() };
        let preview = Preview::connect(&cfg);
        assert!(!preview.is_bound());
        assert!(!preview.is_playing());
        assert_eq!((preview.current().width, preview.current().height), (640, 480));
    }

    #[test]
    fn unbound_preview_stays_blank() {
        let mut preview = Preview::unbound(8, 6);
        assert!(!preview.is_bound());
        preview.play();
        assert!(!preview.is_playing());
        preview.pump().unwrap();
        assert!(preview.current().is_blank());
        assert_eq!((preview.current().width, preview.current().height), (8, 6));
    }
}

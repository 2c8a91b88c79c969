// Application state, built once at startup. Every user action is a method
// here; the frame loop in `main.rs` only translates input into these calls.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::camera::Preview;
use crate::compositor::concat_canvas;
use crate::config::AppConfig;
use crate::dialog::{Dialog, Dialogs};
use crate::error::Error;
use crate::exporter::canvas_download;
use crate::gallery::FrameGallery;
use crate::shutter::{Shutter, ShutterEvent, ShutterState};
use crate::sound::ShutterSound;
use crate::types::FrameBuffer;

pub struct App {
    config: AppConfig,
    preview: Preview,
    overlay: FrameBuffer, // active decorative frame
    still: FrameBuffer,   // snapshot taken at the shutter
    result: FrameBuffer,  // still + overlay, flattened
    gallery: FrameGallery,
    dialogs: Dialogs,
    shutter: Shutter,
    sound: ShutterSound,
    last_saved: Option<PathBuf>,
}

impl App {
    /// Set up canvases at the capture size and start drawing the first frame.
    pub fn new(config: AppConfig, preview: Preview) -> Result<Self, Error> {
        config.validate()?;
        let (w, h) = (config.capture.width as usize, config.capture.height as usize);
        let gallery = FrameGallery::new(&config);
        let mut app = Self {
            preview,
            overlay: FrameBuffer::new(w, h),
            still: FrameBuffer::new(w, h),
            result: FrameBuffer::new(w, h),
            gallery,
            dialogs: Dialogs::default(),
            shutter: Shutter::new(Duration::from_millis(config.reveal_delay_ms)),
            sound: ShutterSound::new(config.sound),
            last_saved: None,
            config,
        };
        app.gallery.select(0, &mut app.dialogs)?;
        Ok(app)
    }

    /// Pull the next live frame (no-op while paused or without a camera).
    pub fn pump_preview(&mut self) -> Result<(), Error> {
        self.preview.pump()
    }

    /// Pick overlay frame `index`. Only while the live preview is up.
    pub fn select_frame(&mut self, index: usize) -> Result<bool, Error> {
        if !self.shutter.is_previewing() {
            debug!("frame pick {index} ignored in {:?}", self.shutter.state());
            return Ok(false);
        }
        self.gallery.select(index, &mut self.dialogs)
    }

    /// Shutter: freeze the preview, click, snapshot, composite, and schedule
    /// the result dialog. A compositing failure is returned after the
    /// sequence has moved on; the result keeps whatever got drawn.
    /// Ignored while a frame is still loading: the loading dialog is modal.
    pub fn shutter(&mut self, now: Instant) -> Result<(), Error> {
        if self.gallery.is_loading() {
            debug!("shutter ignored while frame {} loads", self.gallery.selected());
            return Ok(());
        }
        if !self.shutter.on(ShutterEvent::Fire) {
            return Ok(());
        }
        self.preview.pause();
        self.sound.play();

        self.still.clear();
        self.still.draw_canvas_scaled(self.preview.current());
        self.shutter.on(ShutterEvent::Captured);

        self.result.clear();
        let composited = concat_canvas(&mut self.result, &[&self.still, &self.overlay]);
        self.shutter.on(ShutterEvent::Composited(now));
        composited
    }

    /// Apply finished frame decodes and open the result dialog once the
    /// reveal delay has passed.
    pub fn tick(&mut self, now: Instant) {
        self.gallery.poll(&mut self.overlay, &mut self.dialogs);
        if self.shutter.on(ShutterEvent::Tick(now)) {
            self.dialogs.show(Dialog::Result);
        }
    }

    /// Close the result dialog and resume the live preview.
    pub fn close_result(&mut self) -> bool {
        if !self.shutter.on(ShutterEvent::Close) {
            return false;
        }
        self.dialogs.hide(Dialog::Result);
        self.preview.play();
        true
    }

    /// Save the result canvas. Only offered from the result dialog.
    pub fn download(&mut self) -> Result<Option<PathBuf>, Error> {
        if self.shutter.state() != ShutterState::AwaitingClose {
            debug!("download ignored in {:?}", self.shutter.state());
            return Ok(None);
        }
        let path = canvas_download(
            &self.result,
            &self.config.mime,
            &self.config.filename,
            &self.config.download_dir(),
        )?;
        info!("photo saved to {}", path.display());
        self.last_saved = Some(path.clone());
        Ok(Some(path))
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn overlay(&self) -> &FrameBuffer {
        &self.overlay
    }

    #[cfg(test)]
    pub fn still(&self) -> &FrameBuffer {
        &self.still
    }

    pub fn result(&self) -> &FrameBuffer {
        &self.result
    }

    pub fn gallery(&self) -> &FrameGallery {
        &self.gallery
    }

    pub fn dialogs(&self) -> &Dialogs {
        &self.dialogs
    }

    pub fn shutter_state(&self) -> &Shutter {
        &self.shutter
    }

    pub fn last_saved(&self) -> Option<&PathBuf> {
        self.last_saved.as_ref()
    }

    /// Block until a pending frame pick has been drawn.
    #[cfg(test)]
    pub fn settle_overlay(&mut self, timeout: Duration) -> bool {
        self.gallery.wait(&mut self.overlay, &mut self.dialogs, timeout)
    }
}

// The frame gallery: thumbnails for every overlay frame and the redraw of the
// overlay canvas when one is picked.
//
// Decoding a large frame happens on a worker thread. Each request gets a
// ticket; only the result carrying the latest ticket is drawn, so a slow
// decode of an earlier pick can never paint over a later one.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use image::{ImageReader, RgbaImage};
use log::{debug, error, info, warn};

use crate::config::{AppConfig, OverlayFrame};
use crate::dialog::{Dialog, Dialogs};
use crate::error::Error;
use crate::types::FrameBuffer;

/// Thumbnail tile edge in pixels.
pub const THUMB_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryState {
    Idle,
    Loading { ticket: u64, index: usize },
}

struct Decoded {
    ticket: u64,
    index: usize,
    image: Result<RgbaImage, Error>,
}

pub struct FrameGallery {
    frames: Vec<OverlayFrame>, // paths already resolved against the asset root
    thumbnails: Vec<FrameBuffer>,
    active: usize,
    state: GalleryState,
    next_ticket: u64,
    tx: Sender<Decoded>,
    rx: Receiver<Decoded>,
}

impl FrameGallery {
    /// Resolve frame paths and load every thumbnail, in list order.
    pub fn new(cfg: &AppConfig) -> Self {
        let frames: Vec<OverlayFrame> = cfg
            .frames
            .iter()
            .map(|f| OverlayFrame { large: cfg.resolve_asset(&f.large), small: cfg.resolve_asset(&f.small) })
            .collect();
        let thumbnails = frames.iter().map(|f| load_thumbnail(&f.small)).collect();
        let (tx, rx) = mpsc::channel();
        info!("gallery: {} frames", frames.len());
        Self { frames, thumbnails, active: 0, state: GalleryState::Idle, next_ticket: 1, tx, rx }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn thumbnails(&self) -> &[FrameBuffer] {
        &self.thumbnails
    }

    /// Index of the overlay currently drawn on the overlay canvas.
    #[cfg(test)]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Index the user last picked (may still be loading).
    pub fn selected(&self) -> usize {
        match self.state {
            GalleryState::Loading { index, .. } => index,
            GalleryState::Idle => self.active,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, GalleryState::Loading { .. })
    }

    /// Start loading frame `index`'s large image and show the loading dialog.
    /// Returns false for an index outside the list.
    pub fn select(&mut self, index: usize, dialogs: &mut Dialogs) -> Result<bool, Error> {
        let Some(frame) = self.frames.get(index) else {
            warn!("frame {index} does not exist ({} frames)", self.frames.len());
            return Ok(false);
        };
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        if let GalleryState::Loading { ticket: old, .. } = self.state {
            debug!("frame pick {ticket} supersedes {old}");
        }

        let path = frame.large.clone();
        let tx = self.tx.clone();
        thread::Builder::new()
            .name(format!("frame-decode-{ticket}"))
            .spawn(move || {
                let image = decode_rgba(&path);
                // receiver gone means the app is shutting down
                let _ = tx.send(Decoded { ticket, index, image });
            })?;

        self.state = GalleryState::Loading { ticket, index };
        dialogs.show(Dialog::Loading);
        Ok(true)
    }

    /// Apply any finished decode. Returns true once the pending pick settled.
    pub fn poll(&mut self, overlay: &mut FrameBuffer, dialogs: &mut Dialogs) -> bool {
        let mut settled = false;
        while let Ok(done) = self.rx.try_recv() {
            settled |= self.apply(done, overlay, dialogs);
        }
        settled
    }

    /// Block until the pending pick settles or `timeout` passes.
    #[cfg(test)]
    pub fn wait(&mut self, overlay: &mut FrameBuffer, dialogs: &mut Dialogs, timeout: std::time::Duration) -> bool {
        use std::sync::mpsc::RecvTimeoutError;
        use std::time::Instant;

        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(done) => {
                    self.apply(done, overlay, dialogs);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    fn apply(&mut self, done: Decoded, overlay: &mut FrameBuffer, dialogs: &mut Dialogs) -> bool {
        match self.state {
            GalleryState::Loading { ticket, .. } if ticket == done.ticket => {}
            _ => {
                debug!("dropping stale frame decode {} (frame {})", done.ticket, done.index);
                return false;
            }
        }
        match done.image {
            Ok(image) => {
                overlay.clear();
                overlay.draw_image_scaled(&image);
                self.active = done.index;
                debug!("overlay now frame {}", done.index);
            }
            Err(e) => error!("{}: {e}", e.name()),
        }
        dialogs.hide(Dialog::Loading);
        self.state = GalleryState::Idle;
        true
    }
}

/// Decode by content, not extension; frame assets are not always named `.png`.
fn decode_rgba(path: &Path) -> Result<RgbaImage, Error> {
    let fail = |reason: String| Error::AssetLoad { path: path.display().to_string(), reason };
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| fail(e.to_string()))?;
    let image = reader.decode().map_err(|e| fail(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Small image scaled into a square tile; a missing file gives an empty tile.
fn load_thumbnail(path: &Path) -> FrameBuffer {
    let mut tile = FrameBuffer::new(THUMB_SIZE, THUMB_SIZE);
    match decode_rgba(path) {
        Ok(img) => tile.draw_image_scaled(&img),
        Err(e) => warn!("thumbnail: {e}"),
    }
    tile
}

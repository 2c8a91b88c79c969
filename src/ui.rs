// Screen layout and per-frame rendering of the booth.
//
//   +--------------------------------+
//   |  live preview + active frame   |  view_w x view_h
//   |  HUD text                      |
//   +--------------------------------+
//   | [1] [2] [3] ...  frame strip   |  STRIP_H
//   +--------------------------------+
//
// Dialogs are drawn last over a dimmed copy of everything else.

use std::time::Instant;

use crate::app::App;
use crate::dialog::Dialog;
use crate::draw::{Rect, blit_scaled, dim, draw_text, draw_text_5x7, fill_rect, stroke_rect, text_width};
use crate::fx;
use crate::gallery::THUMB_SIZE;
use crate::types::{FrameBuffer, opaque};

const PAD: usize = 10;
pub const STRIP_H: usize = THUMB_SIZE + 2 * PAD;

const BACKGROUND: u32 = 0xFF_20_20_24;
const TILE_BG: u32 = 0xFF_FF_FF_FF;
const SELECTED: u32 = 0xFF_FF_CC_33;
const TEXT: u32 = 0xFF_FF_FF_FF;
const PANEL: u32 = 0xFF_30_30_36;

pub struct Layout {
    pub width: usize,
    pub height: usize,
    pub view: Rect,
    pub thumbs: Vec<Rect>,
}

impl Layout {
    /// Window layout for a `view_w`x`view_h` preview and `frames` thumbnails.
    pub fn new(view_w: usize, view_h: usize, frames: usize) -> Self {
        let view = Rect::new(0, 0, view_w, view_h);
        let thumbs = (0..frames)
            .map(|i| Rect::new(PAD + i * (THUMB_SIZE + PAD), view_h + PAD, THUMB_SIZE, THUMB_SIZE))
            .collect::<Vec<_>>();
        let strip_w = PAD + frames * (THUMB_SIZE + PAD);
        Self { width: view_w.max(strip_w), height: view_h + STRIP_H, view, thumbs }
    }

    /// Index of the thumbnail under (x,y).
    pub fn thumb_at(&self, x: usize, y: usize) -> Option<usize> {
        self.thumbs.iter().position(|r| r.contains(x, y))
    }

    /// Where the result photo goes inside its dialog: 3/4 of the view, centered.
    pub fn result_rect(&self) -> Rect {
        let w = self.view.w * 3 / 4;
        let h = self.view.h * 3 / 4;
        Rect::new((self.width - w) / 2, ((self.height - h) / 2).saturating_sub(PAD), w, h)
    }
}

/// One line of hints for the current state.
pub fn hud_text(app: &App) -> String {
    if app.dialogs().is_visible(Dialog::Result) {
        return String::new();
    }
    let camera = match (app.preview().is_bound(), app.preview().is_playing()) {
        (false, _) => "NO CAMERA",
        (true, true) => "LIVE",
        (true, false) => "PAUSED",
    };
    format!(
        "{camera} | FRAME {}/{} | SPACE: SHUTTER  1-{}: FRAME  ESC: QUIT",
        app.gallery().selected() + 1,
        app.gallery().len(),
        app.gallery().len().min(9),
    )
}

/// Draw the whole window for this frame.
pub fn render(app: &App, layout: &Layout, screen: &mut FrameBuffer, now: Instant) {
    screen.pixels.fill(BACKGROUND);

    // preview with the active frame on top
    blit_scaled(screen, app.preview().current(), layout.view);
    blit_scaled(screen, app.overlay(), layout.view);
    if !app.preview().is_bound() {
        centered_text(screen, layout.view, "NO CAMERA", 3);
    }

    // frame strip
    let selected = app.gallery().selected();
    for (i, (rect, thumb)) in layout.thumbs.iter().zip(app.gallery().thumbnails()).enumerate() {
        fill_rect(screen, *rect, TILE_BG);
        blit_scaled(screen, thumb, *rect);
        if i == selected {
            stroke_rect(screen, rect.inflate(3), 3, SELECTED);
        }
        if i < 9 {
            draw_text_5x7(screen, rect.x as i32 + 3, rect.y as i32 + 3, &(i + 1).to_string(), TEXT);
        }
    }

    draw_text_5x7(screen, 8, 8, &hud_text(app), TEXT);

    if let Some(t) = app.shutter_state().reveal_progress(now) {
        fx::flash(screen, layout.view, fx::flash_strength(t));
    }

    let dialogs = app.dialogs();
    if dialogs.backdrop_visible() {
        dim(screen, 96);
    }
    if dialogs.is_visible(Dialog::Result) {
        result_dialog(app, layout, screen);
    }
    if dialogs.is_visible(Dialog::Loading) {
        let r = Rect::new((layout.width / 2).saturating_sub(90), (layout.height / 2).saturating_sub(25), 180, 50);
        fill_rect(screen, r, PANEL);
        stroke_rect(screen, r, 2, TEXT);
        centered_text(screen, r, "LOADING...", 2);
    }
}

fn result_dialog(app: &App, layout: &Layout, screen: &mut FrameBuffer) {
    let photo = layout.result_rect();
    let panel = Rect::new(photo.x.saturating_sub(PAD), photo.y.saturating_sub(PAD), photo.w + 2 * PAD, photo.h + 2 * PAD + 40);
    fill_rect(screen, panel, PANEL);
    blit_scaled(screen, app.result(), photo);
    stroke_rect(screen, photo.inflate(1), 1, TEXT);

    let footer_y = (photo.y + photo.h + PAD + 4) as i32;
    draw_text(screen, photo.x as i32, footer_y, "S/ENTER: SAVE   X/ESC: CLOSE", TEXT, 2);

    if let Some(path) = app.last_saved() {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        draw_text_5x7(screen, photo.x as i32, footer_y + 20, &format!("SAVED: {name}"), opaque(0x99FF99));
    }
}

fn centered_text(screen: &mut FrameBuffer, r: Rect, text: &str, scale: usize) {
    let w = text_width(text, scale);
    let x = r.x + r.w.saturating_sub(w) / 2;
    let y = r.y + r.h.saturating_sub(7 * scale) / 2;
    draw_text(screen, x as i32, y as i32, text, TEXT, scale);
}

// What you SEE:
// • The live camera with the chosen decorative frame on top, frame strip below.
// • Click a thumbnail (or press 1-9) to switch frames.
// • SPACE: shutter. The picture flashes, then the result dialog opens.
// • In the dialog: S/Enter saves the photo, X/Esc closes it. Esc quits otherwise.

mod app;
mod camera;
mod cli;
mod compositor;
mod config;
mod dialog;
mod draw;
mod error;
mod exporter;
mod fx;
mod gallery;
mod shutter;
mod sound;
mod types;
mod ui;

use app::App;
use camera::Preview;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use dialog::Dialog;
use draw::Drawer;
use error::Error;
use log::{debug, error, info};
use std::time::{Duration, Instant};
use types::FrameBuffer;
use ui::Layout;

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = AppConfig::from_cli(&cli)?;
    info!(
        "frame-booth {}: {} frames from {}",
        env!("CARGO_PKG_VERSION"),
        config.frames.len(),
        config.asset_root.display()
    );

    /* --- Camera (one attempt) + app state ---
       A missing camera is logged and the booth runs with a blank preview. */
    let preview = Preview::connect(&config.capture);
    let (view_w, view_h) = (config.capture.width as usize, config.capture.height as usize);
    let mut app = App::new(config, preview)?;

    /* --- Window + reusable screen buffer --- */
    let layout = Layout::new(view_w, view_h, app.gallery().len());
    let mut drawer = Drawer::new("Frame Booth", layout.width, layout.height)?;
    let mut screen = FrameBuffer::new(layout.width, layout.height);

    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() {
        /* 1) Fresh live frame (blocks on the camera while playing).
              A bad frame is logged; the preview keeps the last good one. */
        report(app.pump_preview());

        /* 2) Inputs -> handlers. Handler errors are logged, never fatal. */
        let now = Instant::now();
        let result_up = app.dialogs().is_visible(Dialog::Result);

        if drawer.escape_pressed() {
            if result_up {
                app.close_result();
            } else {
                break;
            }
        }
        if result_up {
            if drawer.close_pressed() {
                app.close_result();
            }
            if drawer.save_pressed() {
                report(app.download());
            }
        } else {
            if drawer.shutter_pressed() {
                report(app.shutter(now));
            }
            let clicked = drawer.clicked_at().and_then(|(x, y)| layout.thumb_at(x, y));
            if let Some(index) = drawer.digit_pressed().or(clicked) {
                report(app.select_frame(index));
            }
        }

        /* 3) Finished decodes, reveal timer. */
        app.tick(now);

        /* 4) Draw + present. */
        ui::render(&app, &layout, &mut screen, now);
        drawer.present(&screen)?;

        /* 5) FPS once per second (debug log). */
        frames_this_second += 1;
        let elapsed = now.duration_since(last_fps_time);
        if elapsed >= Duration::from_secs(1) {
            debug!("FPS: {:.1}", frames_this_second as f32 / elapsed.as_secs_f32());
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    info!("bye");
    Ok(())
}

/// Log a failed handler as `name: message` and carry on.
fn report<T>(result: Result<T, Error>) {
    if let Err(e) = result {
        error!("{}: {e}", e.name());
    }
}

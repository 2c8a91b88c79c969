// Command line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Facing;

/// Webcam photo booth: pick a frame, press Space, save the picture.
///
/// Keys: Space shutter, 1-9 pick frame, S/Enter save, X/Esc close, Esc quit.
#[derive(Parser, Debug)]
#[command(name = "frame-booth")]
#[command(version, about)]
pub struct Cli {
    /// TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the frame images are resolved against
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Where saved photos go (default: your Downloads folder)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Camera device index (overrides --facing)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Preferred camera direction
    #[arg(long, value_enum)]
    pub facing: Option<Facing>,

    /// Image type for saved photos: image/png, image/jpeg or image/bmp
    #[arg(long)]
    pub mime: Option<String>,

    /// No shutter sound
    #[arg(long)]
    pub mute: bool,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long)]
    pub verbose: bool,
}

// Booth configuration.
//
// Defaults reproduce the classic booth: a 640x480 front camera, two gold and
// silver frames, PNG downloads named `photo`. A TOML file can override any
// field; CLI flags override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::Error;
use crate::exporter::{DEFAULT_FILENAME, DEFAULT_MIME};

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Front camera, looking at the user.
    User,
    /// Rear camera, looking away from the user.
    Environment,
}

/// One decorative frame: `large` is drawn over the photo, `small` is its
/// thumbnail in the gallery strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayFrame {
    pub large: PathBuf,
    pub small: PathBuf,
}

impl OverlayFrame {
    pub fn new(large: impl Into<PathBuf>, small: impl Into<PathBuf>) -> Self {
        Self { large: large.into(), small: small.into() }
    }
}

/// What we ask the camera for. Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
    /// Explicit device index; wins over `facing` when set.
    pub camera_index: Option<u32>,
    /// Kept for parity with media constraints; the booth never records audio.
    pub audio: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { width: 640, height: 480, facing: Facing::User, camera_index: None, audio: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub frames: Vec<OverlayFrame>,
    /// Frame paths are resolved against this directory.
    pub asset_root: PathBuf,
    /// Where downloads land; `None` means the user's Downloads folder.
    pub download_dir: Option<PathBuf>,
    pub filename: String,
    pub mime: String,
    /// Pause between the shutter and the result dialog.
    pub reveal_delay_ms: u64,
    pub sound: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            frames: vec![
                OverlayFrame::new("ougonhi.png", "ougonhi.png"),
                OverlayFrame::new("hakuginhi.png", "hakuginhi.png"),
            ],
            asset_root: PathBuf::from("assets"),
            download_dir: None,
            filename: DEFAULT_FILENAME.to_string(),
            mime: DEFAULT_MIME.to_string(),
            reveal_delay_ms: 300,
            sound: true,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let cfg: AppConfig = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// File (if any) first, then CLI flags on top.
    pub fn from_cli(cli: &Cli) -> Result<Self, Error> {
        let mut cfg = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(dir) = &cli.assets {
            cfg.asset_root = dir.clone();
        }
        if let Some(dir) = &cli.download_dir {
            cfg.download_dir = Some(dir.clone());
        }
        if let Some(index) = cli.camera {
            cfg.capture.camera_index = Some(index);
        }
        if let Some(facing) = cli.facing {
            cfg.capture.facing = facing;
        }
        if let Some(mime) = &cli.mime {
            cfg.mime = mime.clone();
        }
        if cli.mute {
            cfg.sound = false;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.frames.is_empty() {
            return Err(Error::Config("at least one overlay frame is required".into()));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(Error::Config("capture size must be non-zero".into()));
        }
        if self.filename.trim().is_empty() {
            return Err(Error::Config("download filename must not be empty".into()));
        }
        Ok(())
    }

    pub fn resolve_asset(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.asset_root.join(path) }
    }

    /// Download directory: configured, else ~/Downloads, else the cwd.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn defaults_match_booth() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.capture.width, 640);
        assert_eq!(cfg.capture.height, 480);
        assert_eq!(cfg.capture.facing, Facing::User);
        assert!(!cfg.capture.audio);
        assert_eq!(cfg.frames.len(), 2);
        assert_eq!(cfg.frames[0].large, PathBuf::from("ougonhi.png"));
        assert_eq!(cfg.filename, "photo");
        assert_eq!(cfg.mime, "image/png");
        assert_eq!(cfg.reveal_delay_ms, 300);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            reveal_delay_ms = 50
            [[frames]]
            large = "a_large.png"
            small = "a_small.png"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.reveal_delay_ms, 50);
        assert_eq!(cfg.frames, vec![OverlayFrame::new("a_large.png", "a_small.png")]);
        assert_eq!(cfg.filename, "photo");
        assert_eq!(cfg.capture, CaptureConfig::default());
    }

    #[test]
    fn empty_frame_list_rejected() {
        let err = AppConfig::from_toml_str("frames = []").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn facing_parses_lowercase() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [capture]
            width = 320
            height = 240
            facing = "environment"
            audio = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.capture.facing, Facing::Environment);
        assert_eq!(cfg.capture.width, 320);
    }

    #[test]
    fn cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mime = \"image/jpeg\"\nsound = true").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::parse_from([
            "frame-booth", "--config", path.as_str(), "--assets", "/tmp/frames", "--mute", "--camera", "2",
        ]);
        let cfg = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(cfg.mime, "image/jpeg");
        assert!(!cfg.sound);
        assert_eq!(cfg.asset_root, PathBuf::from("/tmp/frames"));
        assert_eq!(cfg.capture.camera_index, Some(2));
    }

    #[test]
    fn relative_assets_resolve_under_root() {
        let cfg = AppConfig { asset_root: PathBuf::from("/srv/booth"), ..AppConfig::default() };
        assert_eq!(cfg.resolve_asset(Path::new("gold.png")), PathBuf::from("/srv/booth/gold.png"));
        assert_eq!(cfg.resolve_asset(Path::new("/abs/x.png")), PathBuf::from("/abs/x.png"));
    }
}

// One error type for the whole booth.
// Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed
    #[error("Asset load error: {path}: {reason}")]
    AssetLoad { path: String, reason: String }, // Overlay/thumbnail image could not be read
    #[error("Encode error: {0}")]
    Encode(String), // Canvas -> image bytes failed
    #[error("Decode error: {0}")]
    Decode(String), // Image bytes / data URL -> pixels failed
    #[error("Export error: {0}")]
    Export(String), // Writing the downloaded file failed
    #[error("Config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short name used when logging capture failures as `name: message`.
    pub fn name(&self) -> &'static str {
        match self {
            Error::WindowInit(_) => "WindowInitError",
            Error::WindowUpdate(_) => "WindowUpdateError",
            Error::CameraInit(_) => "NotReadableError",
            Error::CameraFrame(_) => "CameraFrameError",
            Error::AssetLoad { .. } => "AssetLoadError",
            Error::Encode(_) => "EncodingError",
            Error::Decode(_) => "DecodingError",
            Error::Export(_) => "ExportError",
            Error::Config(_) => "ConfigError",
            Error::Io(_) => "IoError",
        }
    }
}

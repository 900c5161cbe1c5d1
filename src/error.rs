use std::path::{Path, PathBuf};

/// Errors raised by the estimation pipeline and its collaborators.
#[derive(Debug)]
pub enum SpeedError {
    /// Capture time missing, malformed, or the file could not be read.
    Metadata { path: PathBuf, reason: String },
    /// Image could not be opened or decoded.
    ImageLoad { path: PathBuf, reason: String },
    /// Matching was asked to work on an empty descriptor set.
    InvalidInput(String),
    /// Elapsed time between the two captures is zero.
    DivisionByZero,
    /// The camera failed to produce an image.
    Capture { path: PathBuf, reason: String },
    /// Configuration value out of range or unreadable.
    Config(String),
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpeedError>;

impl SpeedError {
    pub fn metadata(path: &Path, reason: impl Into<String>) -> Self {
        SpeedError::Metadata {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn image_load(path: &Path, reason: impl Into<String>) -> Self {
        SpeedError::ImageLoad {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn capture(path: &Path, reason: impl Into<String>) -> Self {
        SpeedError::Capture {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SpeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedError::Metadata { path, reason } => {
                write!(f, "metadata error for '{}': {}", path.display(), reason)
            }
            SpeedError::ImageLoad { path, reason } => {
                write!(f, "failed to read image '{}': {}", path.display(), reason)
            }
            SpeedError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            SpeedError::DivisionByZero => {
                write!(f, "time difference is zero; cannot compute speed")
            }
            SpeedError::Capture { path, reason } => {
                write!(f, "capture to '{}' failed: {}", path.display(), reason)
            }
            SpeedError::Config(msg) => write!(f, "configuration error: {}", msg),
            SpeedError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SpeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpeedError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SpeedError {
    fn from(e: std::io::Error) -> Self {
        SpeedError::Io(e)
    }
}

impl From<serde_json::Error> for SpeedError {
    fn from(e: serde_json::Error) -> Self {
        SpeedError::Config(e.to_string())
    }
}

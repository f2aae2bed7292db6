use thiserror::Error;

/// Errors raised by the raster core.
///
/// Out-of-bounds pixel access is not an error; `get`/`set` report it through
/// their return values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("invalid size {width}x{height}")]
    InvalidSize { width: i64, height: i64 },

    #[error("layer index {index} out of range (layer count {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised while reading or writing files.
#[derive(Debug, Error)]
pub enum ProjectFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Image codec error: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

impl From<Box<bincode::ErrorKind>> for ProjectFileError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        ProjectFileError::Serialize(e.to_string())
    }
}

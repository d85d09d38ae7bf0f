use thiserror::Error;

/// Library error type for the gallery's outer surface.
///
/// Per-image decode failures never reach this type; they are absorbed by
/// the atlas builder.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured photo library path is missing or not a directory.
    #[error("invalid photo directory: {0}")]
    BadDir(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

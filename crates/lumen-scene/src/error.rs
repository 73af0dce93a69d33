//! Error types for scene construction and loading.

use thiserror::Error;

/// Errors that can occur while building or loading a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    /// Render parameters out of range.
    #[error("invalid render parameters: {0}")]
    InvalidParams(String),

    /// A primitive cannot be rendered.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// TOML scene description could not be parsed.
    #[error("failed to parse TOML scene: {0}")]
    Toml(#[from] toml::de::Error),

    /// Scene description could not be written as TOML.
    #[error("failed to write TOML scene: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// JSON scene description could not be parsed or written.
    #[error("JSON scene error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a scene file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;

//! Crate error type

use thiserror::Error;

/// Errors raised while setting up or running a level
#[derive(Debug, Error)]
pub enum SandlotError {
    #[error("level is already initialized")]
    AlreadyInitialized,

    #[error("level has been destroyed")]
    LevelDestroyed,

    #[error("no browser window available")]
    MissingWindow,

    #[error("element '{0}' not found")]
    MissingElement(String),

    #[error("element '{0}' is not a canvas")]
    NotACanvas(String),

    #[error("failed to create render surface: {0}")]
    Surface(String),

    #[error("no suitable graphics adapter: {0}")]
    Adapter(String),

    #[error("failed to create graphics device: {0}")]
    Device(String),

    #[error("audio unavailable: {0}")]
    Audio(String),
}

pub type Result<T> = std::result::Result<T, SandlotError>;

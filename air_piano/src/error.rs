//! Application error types.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::source::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to open window: {0}")]
    Window(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to write recording to {path:?}: {source}")]
    Record {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("--headless needs a --replay trace")]
    HeadlessWithoutTrace,
}

use thiserror::Error;

/// Errors surfaced by flinch outside of the round sequencer itself.
///
/// Input arriving in the wrong state is never an error; the sequencer ignores
/// it. Everything here is configuration or I/O.
#[derive(Debug, Error)]
pub enum FlinchError {
    /// No valid round schedule can be produced from the given settings
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No content pack is bundled for the requested language
    #[error("content pack not found: {0}")]
    ContentNotFound(String),

    #[error("failed to set up logging: {0}")]
    Logging(String),
}

impl FlinchError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FlinchError>;

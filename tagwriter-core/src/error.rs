use thiserror::Error;

/// Errors surfaced by the tagwriter library.
///
/// The reveal loop logs `InvalidParameter` and moves on; a `Clock` failure
/// ends the session as cancelled.
#[derive(Debug, Error)]
pub enum TagwriterError {
    #[error("invalid parameter for [{tag}]: {value:?}")]
    InvalidParameter { tag: String, value: String },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("clock failure: {0}")]
    Clock(String),
}

pub type Result<T> = std::result::Result<T, TagwriterError>;

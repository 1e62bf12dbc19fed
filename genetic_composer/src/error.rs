use genetic_composer_theory::TheoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Theory(#[from] TheoryError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown fitness feature '{0}'")]
    UnknownFeature(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ComposerError>;

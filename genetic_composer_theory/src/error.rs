use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    #[error("unrecognized scale '{0}'")]
    InvalidScale(String),
    #[error("invalid note range {low}..={high}: pitches must be non-negative and low must not exceed high")]
    InvalidNoteRange { low: i32, high: i32 },
    #[error("invalid note name '{0}'")]
    InvalidNoteName(String),
}

pub type Result<T> = std::result::Result<T, TheoryError>;

use crate::llm::{GenerateError, GenerationError};
use crate::store::StoreError;

/// Why a stage did not produce a stored output
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    Parse(String),

    /// Required upstream state is missing or unusable
    #[error("{0}")]
    Precondition(String),

    #[error("failed to persist output: {0}")]
    Persistence(#[from] StoreError),
}

impl From<GenerateError> for StageError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Generation(e) => StageError::Generation(e),
            GenerateError::Parse(msg) => StageError::Parse(msg),
        }
    }
}

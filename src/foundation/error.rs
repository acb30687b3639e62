/// Convenience result type used across stagecraft.
pub type StageResult<T> = Result<T, StageError>;

/// Top-level error taxonomy used by editor-core APIs.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// Invalid user-provided project or settings data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while evaluating or rendering a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors while reading or decoding an asset.
    #[error("asset error: {0}")]
    Asset(String),

    /// Malformed sticker id or unknown sticker provider.
    #[error("sticker error: {0}")]
    Sticker(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Build a [`StageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StageError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`StageError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`StageError::Sticker`] value.
    pub fn sticker(msg: impl Into<String>) -> Self {
        Self::Sticker(msg.into())
    }

    /// Build a [`StageError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

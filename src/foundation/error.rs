/// Convenience result type used across reelforge.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by export APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided timeline, config or call sequence.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while evaluating timeline state for a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A media backend failed to open, decode or sample a source.
    #[error("decode error: {0}")]
    Decode(String),

    /// A video seek did not signal completion within its adaptive timeout.
    #[error("seek to {target_secs:.3}s timed out after {timeout_ms}ms ({url})")]
    SeekTimeout {
        /// Source URL of the decode handle.
        url: String,
        /// Requested source time.
        target_secs: f64,
        /// Timeout that was exceeded.
        timeout_ms: u64,
    },

    /// A rendered region was rejected by the frame validator.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Offline audio pass allocation, scheduling or rendering failed.
    #[error("audio error: {0}")]
    Audio(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ReelError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ReelError::InvalidFrame`] value.
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    /// Build a [`ReelError::Audio`] value.
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the render-one-video-frame retry loop should try again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::SeekTimeout { .. } | Self::InvalidFrame(_)
        )
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

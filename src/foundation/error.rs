/// Convenience result type used across sceneweave.
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Top-level error taxonomy used by scene, encoding and assembly APIs.
#[derive(thiserror::Error, Debug)]
pub enum WeaveError {
    /// Malformed call; the operation is aborted before any side effect.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Animation lifecycle violations (e.g. stepping a finished animation).
    #[error("animation error: {0}")]
    Animation(String),

    /// The renderer could not produce a frame.
    #[error("render error: {0}")]
    Render(String),

    /// The encoder for one segment exited abnormally; that segment is dropped.
    #[error("encoding failure for segment {index}: {message}")]
    Encoding {
        /// Index of the affected segment.
        index: u64,
        /// Human-readable detail (usually the encoder's stderr).
        message: String,
    },

    /// Concatenation or muxing failed; no output file was produced.
    #[error("assembly failure: {0}")]
    Assembly(String),

    /// Cooperative stop signal raised once the configured last operation is reached.
    #[error("scene ended early")]
    EarlyTermination,

    /// Errors when serializing or deserializing scripts and configs.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WeaveError {
    /// Build a [`WeaveError::InvalidArgument`] value.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build a [`WeaveError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`WeaveError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`WeaveError::Encoding`] value for segment `index`.
    pub fn encoding(index: u64, msg: impl Into<String>) -> Self {
        Self::Encoding {
            index,
            message: msg.into(),
        }
    }

    /// Build a [`WeaveError::Assembly`] value.
    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    /// Build a [`WeaveError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for the cooperative stop signal, which is not a failure.
    pub fn is_early_termination(&self) -> bool {
        matches!(self, Self::EarlyTermination)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

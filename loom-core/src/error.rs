//! Error types for the design session engine.

/// Result type alias for Loom operations.
pub type Result<T> = std::result::Result<T, LoomError>;

/// Main error type, corresponding to the error taxonomy of §7:
/// `SESSION_NOT_FOUND`, `SESSION_INACTIVE`, `STORAGE_FAULT`,
/// `INTEGRITY_FAULT`, `GENERATOR_FAULT`, `CONTEXT_ADVISORY_FAULT`.
#[derive(Debug, thiserror::Error)]
pub enum LoomError {
    /// Session lookup returned nothing, or the session expired on read.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Edit attempted on a completed or expired session.
    #[error("session inactive: {0}")]
    Inactive(String),

    /// Redis returned an error, or an unexpected nil mid-operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// Stored content_hash did not match the recomputed hash.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// The external wireframe generator timed out or returned invalid data.
    #[error("generator error: {0}")]
    Generator(String),

    /// AddContextEntry or IncrementEditCount failed after a version was
    /// already stored successfully. Never propagated as a hard failure;
    /// callers log and continue.
    #[error("context advisory error: {0}")]
    ContextAdvisory(String),

    /// Malformed input that isn't covered by a more specific variant.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors (missing or malformed environment variables).
    #[error("configuration error: {0}")]
    Config(String),

    /// Catch-all for unexpected failures.
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoomError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn inactive(msg: impl Into<String>) -> Self {
        Self::Inactive(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    pub fn generator(msg: impl Into<String>) -> Self {
        Self::Generator(msg.into())
    }

    pub fn context_advisory(msg: impl Into<String>) -> Self {
        Self::ContextAdvisory(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, Self::Inactive(_))
    }
}

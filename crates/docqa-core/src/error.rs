use std::fmt;

use thiserror::Error;

/// Failures that surface to callers of the core.
///
/// Only `IngestValidation`, `IndexState`, `InvalidQuery` and `InvalidConfig`
/// are returned as hard errors. `EmbeddingProvider` and `SynthesisProvider`
/// are absorbed: the embedder and synthesizer log them and degrade.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Ingest rejected for '{file_name}': {issue}")]
    IngestValidation { file_name: String, issue: IngestIssue },

    #[error("Index state conflict: {0}")]
    IndexState(String),

    #[error("Embedding provider failed: {0}")]
    EmbeddingProvider(#[source] ProviderError),

    #[error("Synthesis provider failed: {0}")]
    SynthesisProvider(#[source] ProviderError),
}

impl Error {
    pub fn ingest(file_name: impl Into<String>, issue: IngestIssue) -> Self {
        Error::IngestValidation { file_name: file_name.into(), issue }
    }

    /// True when the caller sent something unusable (as opposed to a server-side conflict).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidQuery(_) | Error::IngestValidation { .. })
    }
}

/// Why a document was refused at the ingest boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestIssue {
    MissingFileName,
    EmptyContent,
    TooShort { found: usize, minimum: usize },
    NonText { ratio: f64 },
    NoChunks,
}

impl fmt::Display for IngestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestIssue::MissingFileName => write!(f, "fileName is required"),
            IngestIssue::EmptyContent => write!(f, "content is empty or whitespace only"),
            IngestIssue::TooShort { found, minimum } => write!(
                f,
                "content has {found} non-whitespace characters, at least {minimum} required"
            ),
            IngestIssue::NonText { ratio } => write!(
                f,
                "content does not look like text ({:.0}% control or replacement characters)",
                ratio * 100.0
            ),
            IngestIssue::NoChunks => write!(f, "chunking produced 0 chunks"),
        }
    }
}

/// Failures of an external provider call (embedding or LLM).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("transport error: {0}")]
    Http(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    pub fn http<E: fmt::Display>(err: E) -> Self {
        ProviderError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Structured error taxonomy for the answering pipeline.
//!
//! The pipeline distinguishes three failure classes instead of surfacing
//! stringified exceptions: the service has no index yet, the caller sent a
//! bad request, or an upstream dependency (embedding model, vector index,
//! LLM API) failed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// No vector index has been built; run `medi ingest` first.
    #[error("retrieval pipeline is not ready: no index has been built")]
    NotReady,

    /// The request itself is invalid (empty query, bad file name).
    #[error("invalid request: {0}")]
    BadInput(String),

    /// Embedding, index lookup, or LLM invocation failed.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl ChatError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        ChatError::Upstream(err.to_string())
    }
}

//! Core data types shared across ingestion, retrieval, and the API.

use serde::{Deserialize, Serialize};

/// One chunk of page text stored in the vector index.
///
/// `page` is zero-based as produced by the PDF loader; the API converts to
/// one-based before anything is shown to a clinician.
#[derive(Debug, Clone)]
pub struct PageChunk {
    pub id: String,
    /// Source path exactly as seen at ingestion time (e.g. `data/patient_report_001.pdf`).
    pub source: String,
    pub page: i64,
    /// Running chunk index within the source document.
    pub chunk_index: i64,
    pub text: String,
    pub hash: String,
}

/// A chunk returned from similarity search, with its cosine score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: PageChunk,
    pub score: f32,
}

/// Derived view of a retrieved chunk for a specific query. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    /// File basename, not the full ingestion path.
    pub source: String,
    /// One-based page number.
    pub page: i64,
    /// Query-refined excerpt with keyword emphasis.
    pub content: String,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<EvidenceSnippet>,
}

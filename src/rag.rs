//! Retrieval-augmented answering engine.
//!
//! Owns the loaded vector index, the embedding model, and the LLM client.
//! Built exactly once at process startup and handed to request handlers by
//! reference; there is no lazily-initialized global, so concurrent first
//! requests cannot race an initialization.

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::ChatError;
use crate::index::VectorIndex;
use crate::llm::LlmClient;
use crate::models::PageChunk;

pub struct RagAnswer {
    pub answer: String,
    /// The retrieved chunks the answer was conditioned on, most similar first.
    pub context: Vec<PageChunk>,
}

pub struct RagEngine {
    index: VectorIndex,
    embedder: Arc<Embedder>,
    llm: LlmClient,
    top_k: usize,
}

impl RagEngine {
    /// Load the engine: open the persisted index, bring up the embedding
    /// model, and read LLM credentials from the environment.
    ///
    /// A missing index is not an error: the service starts degraded and
    /// answers 503 until `medi ingest` has run. A present index with a
    /// missing API key or a broken model *is* an error: the operator asked
    /// for a working service and cannot get one.
    pub async fn load(config: &Config) -> Result<Option<Self>> {
        let index = match VectorIndex::open(&config.index.path).await? {
            Some(index) => index,
            None => {
                tracing::warn!(
                    path = %config.index.path.display(),
                    "no vector index found; run `medi ingest` to build one"
                );
                return Ok(None);
            }
        };

        let embedder = Embedder::new(&config.embedding).await?;
        let llm = LlmClient::new(&config.llm)?;

        if let Some(indexed_model) = index.get_meta("embedding_model").await? {
            if indexed_model != embedder.model_name() {
                tracing::warn!(
                    indexed = %indexed_model,
                    configured = %embedder.model_name(),
                    "index was built with a different embedding model; re-ingest recommended"
                );
            }
        }

        tracing::info!(
            chunks = index.chunk_count().await?,
            model = embedder.model_name(),
            "retrieval engine ready"
        );

        Ok(Some(Self {
            index,
            embedder,
            llm,
            top_k: config.retrieval.top_k,
        }))
    }

    /// Answer a question, optionally scoped to one source document.
    /// `source_filter` must be the exact path format used at ingestion.
    pub async fn answer(
        &self,
        query: &str,
        source_filter: Option<&str>,
    ) -> Result<RagAnswer, ChatError> {
        let query_vec = self
            .embedder
            .embed_query(query)
            .await
            .map_err(ChatError::upstream)?;

        let scored = self
            .index
            .search(&query_vec, self.top_k, source_filter)
            .await
            .map_err(ChatError::upstream)?;

        let context_text = scored
            .iter()
            .map(|s| s.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let answer = self
            .llm
            .answer(&context_text, query)
            .await
            .map_err(ChatError::upstream)?;

        Ok(RagAnswer {
            answer,
            context: scored.into_iter().map(|s| s.chunk).collect(),
        })
    }
}

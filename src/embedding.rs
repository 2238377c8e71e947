//! Embedding providers and vector helpers.
//!
//! Two providers are supported:
//! - **`local`**: fastembed running `all-MiniLM-L6-v2` (the default; the
//!   model is downloaded on first use and cached, after which embedding is
//!   fully offline).
//! - **`openai`**: the OpenAI embeddings API, keyed by `OPENAI_API_KEY`.
//!
//! Every failure is terminal for its operation: one attempt, no retries.
//! The caller (ingestor or retrieval engine) surfaces the error.
//!
//! Also hosts the BLOB codec used by the SQLite index ([`vec_to_blob`] /
//! [`blob_to_vec`]) and [`cosine_similarity`].

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// A ready-to-use embedding backend. Constructed once (at ingest start or
/// service startup) and shared; never rebuilt per request.
pub enum Embedder {
    #[cfg(feature = "local-embeddings")]
    Local {
        model_name: String,
        dims: usize,
        batch_size: usize,
        model: std::sync::Mutex<fastembed::TextEmbedding>,
    },
    OpenAi {
        model_name: String,
        dims: usize,
        api_key: String,
        timeout: Duration,
    },
}

impl Embedder {
    /// Build the provider named in the config. For `local` this loads the
    /// model (downloading it on first use), so it runs on a blocking thread.
    pub async fn new(config: &EmbeddingConfig) -> Result<Arc<Self>> {
        match config.provider.as_str() {
            #[cfg(feature = "local-embeddings")]
            "local" => {
                let model_name = config.model.clone();
                let dims = config.dims;
                let batch_size = config.batch_size;
                let fastembed_model = fastembed_model_for(&model_name)?;
                let model = tokio::task::spawn_blocking(move || {
                    fastembed::TextEmbedding::try_new(
                        fastembed::InitOptions::new(fastembed_model)
                            .with_show_download_progress(true),
                    )
                })
                .await?
                .map_err(|e| anyhow::anyhow!("Failed to load local embedding model: {}", e))?;

                Ok(Arc::new(Embedder::Local {
                    model_name,
                    dims,
                    batch_size,
                    model: std::sync::Mutex::new(model),
                }))
            }
            #[cfg(not(feature = "local-embeddings"))]
            "local" => bail!(
                "embedding provider 'local' requires the local-embeddings feature; \
                 rebuild with --features local-embeddings or configure provider = \"openai\""
            ),
            "openai" => {
                let api_key = std::env::var("OPENAI_API_KEY")
                    .context("OPENAI_API_KEY environment variable not set")?;
                Ok(Arc::new(Embedder::OpenAi {
                    model_name: config.model.clone(),
                    dims: config.dims,
                    api_key,
                    timeout: Duration::from_secs(config.timeout_secs),
                }))
            }
            other => bail!("Unknown embedding provider: {}", other),
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            #[cfg(feature = "local-embeddings")]
            Embedder::Local { model_name, .. } => model_name,
            Embedder::OpenAi { model_name, .. } => model_name,
        }
    }

    pub fn dims(&self) -> usize {
        match self {
            #[cfg(feature = "local-embeddings")]
            Embedder::Local { dims, .. } => *dims,
            Embedder::OpenAi { dims, .. } => *dims,
        }
    }

    /// Embed a batch of texts, one vector per input, in input order.
    pub async fn embed(self: &Arc<Self>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        match self.as_ref() {
            #[cfg(feature = "local-embeddings")]
            Embedder::Local { batch_size, .. } => {
                let batch = *batch_size;
                let me = Arc::clone(self);
                tokio::task::spawn_blocking(move || {
                    let Embedder::Local { model, .. } = me.as_ref() else {
                        unreachable!("local embed dispatched on non-local provider");
                    };
                    let mut model = model
                        .lock()
                        .map_err(|_| anyhow::anyhow!("embedding model lock poisoned"))?;
                    model
                        .embed(texts, Some(batch))
                        .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))
                })
                .await?
            }
            Embedder::OpenAi {
                model_name,
                api_key,
                timeout,
                ..
            } => embed_openai(model_name, api_key, *timeout, &texts).await,
        }
    }

    /// Embed a single query string.
    pub async fn embed_query(self: &Arc<Self>, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(vec![text.to_string()]).await?;
        if vectors.is_empty() {
            bail!("Empty embedding response");
        }
        Ok(vectors.remove(0))
    }
}

#[cfg(feature = "local-embeddings")]
fn fastembed_model_for(name: &str) -> Result<fastembed::EmbeddingModel> {
    // Accept both the huggingface spelling ("all-MiniLM-L6-v2") and the
    // fastembed spelling ("all-minilm-l6-v2").
    match name.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported: all-MiniLM-L6-v2, \
             bge-small-en-v1.5, bge-base-en-v1.5",
            other
        ),
    }
}

/// One call to `POST /v1/embeddings`. Client errors and network failures
/// are returned as-is; there is no retry loop.
async fn embed_openai(
    model: &str,
    api_key: &str,
    timeout: Duration,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let body = serde_json::json!({
        "model": model,
        "input": texts,
    });

    let response = client
        .post("https://api.openai.com/v1/embeddings")
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&body)
        .send()
        .await
        .context("embedding request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("OpenAI API error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    parse_openai_response(&json)
}

fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing data array"))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing embedding"))?;
        embeddings.push(
            embedding
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect(),
        );
    }
    Ok(embeddings)
}

/// Encode a vector as little-endian f32 bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB written by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity in `[-1, 1]`; `0.0` for empty or mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }

    #[test]
    fn cosine_identical_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn openai_response_parsing() {
        let json = serde_json::json!({
            "data": [
                { "embedding": [0.1, 0.2] },
                { "embedding": [0.3, 0.4] }
            ]
        });
        let parsed = parse_openai_response(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!((parsed[1][0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn openai_response_missing_data_is_error() {
        assert!(parse_openai_response(&serde_json::json!({})).is_err());
    }
}

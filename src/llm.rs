//! Hosted LLM client (Google Generative Language API).
//!
//! One `generateContent` call per question; errors come back to the caller
//! untouched (no retries). The HTTP client carries no timeout on purpose:
//! the chat client bounds the overall wait on its side.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key, read once at construction.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

pub struct LlmClient {
    model: String,
    temperature: f32,
    api_key: String,
    client: reqwest::Client,
}

impl LlmClient {
    /// Build the client. Fails when the API key is absent from the
    /// environment; the engine refuses to come up half-configured.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} environment variable not set", API_KEY_ENV))?;
        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    /// Ask the model to answer `question` grounded in the given record
    /// excerpts. Returns the generated answer text.
    pub async fn answer(&self, context: &str, question: &str) -> Result<String> {
        let prompt = build_prompt(context, question);

        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let url = format!("{}/models/{}:generateContent", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("LLM API error {}: {}", status, body_text);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode LLM response")?;
        extract_answer(parsed)
    }
}

/// Stuff the retrieved excerpts and the question into a single prompt.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a clinical AI assistant. Answer the physician's question using \
         only the medical record excerpts below. If the answer is uncertain or \
         not covered by the excerpts, reply \"Not mentioned in the record.\"\n\n\
         Record excerpts:\n{context}\n\nQuestion: {question}"
    )
}

fn extract_answer(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        bail!("LLM returned no candidates");
    }
    Ok(text)
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_context_and_question() {
        let prompt = build_prompt("EGFR exon 19 deletion.", "What mutation?");
        assert!(prompt.contains("EGFR exon 19 deletion."));
        assert!(prompt.contains("Question: What mutation?"));
        assert!(prompt.contains("Not mentioned in the record."));
    }

    #[test]
    fn response_parsing_joins_parts() {
        let json = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "Osi" }, { "text": "mertinib" } ] } }
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_answer(parsed).unwrap(), "Osimertinib");
    }

    #[test]
    fn empty_response_is_error() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_answer(parsed).is_err());
    }
}

//! # Medi-Insight
//!
//! **Retrieval-augmented question answering over a local corpus of medical
//! PDF reports.**
//!
//! Medi-Insight ingests patient report PDFs into a SQLite vector index and
//! answers physicians' questions by retrieving the most similar report
//! passages and conditioning a hosted LLM on them. Every answer is returned
//! together with cited evidence: source file, page number, and a
//! query-refined excerpt.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐
//! │ PDF      │──▶│  Pipeline      │──▶│  SQLite    │
//! │ corpus   │   │ Extract+Chunk │   │ vectors    │
//! └──────────┘   │  +Embed       │   └─────┬─────┘
//!                └───────────────┘         │
//!                                          ▼
//!                ┌──────────┐        ┌───────────┐      ┌──────────┐
//!                │ Terminal │◀──────▶│  HTTP API  │─────▶│ Gemini   │
//!                │ chat     │        │  (axum)   │      │ API      │
//!                └──────────┘        └───────────┘      └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. [`report`] seeds a sample corpus of synthetic patient reports.
//! 2. [`ingest`] extracts text per page ([`pdf`]), splits it with the
//!    fixed-size overlapping chunker ([`chunk`]), embeds every chunk
//!    ([`embedding`]), and writes a fresh [`index`].
//! 3. [`rag`] answers a question: embed the query, retrieve the top
//!    chunks by cosine similarity, and ask the LLM ([`llm`]) to answer
//!    from those passages only.
//! 4. [`server`] exposes this over HTTP; [`evidence`] refines each cited
//!    passage down to the sentences that mention the query's keywords.
//! 5. [`chat`] is the physician-facing terminal client.
//!
//! ## Modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`chat`] | Interactive terminal client |
//! | [`chunk`] | Fixed-size overlapping text chunker |
//! | [`config`] | TOML configuration with defaults |
//! | [`embedding`] | Local (fastembed) and OpenAI-compatible embedders |
//! | [`error`] | Request-level error taxonomy |
//! | [`evidence`] | Keyword-based passage refinement |
//! | [`index`] | SQLite vector index |
//! | [`ingest`] | PDF ingestion pipeline |
//! | [`llm`] | Gemini `generateContent` client |
//! | [`models`] | Shared data types |
//! | [`pdf`] | Per-page PDF text extraction |
//! | [`rag`] | Retrieval-augmented answering engine |
//! | [`report`] | Sample corpus seeder |
//! | [`server`] | HTTP API (axum) |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod evidence;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pdf;
pub mod rag;
pub mod report;
pub mod server;

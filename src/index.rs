//! Persisted vector index.
//!
//! A single SQLite database holds every chunk with its embedding stored as
//! a little-endian f32 BLOB; similarity search decodes the candidate set
//! and ranks by cosine in Rust. The index is rebuilt wholesale by the
//! ingestor; there is no in-place update path.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{PageChunk, ScoredChunk};

pub struct VectorIndex {
    pool: SqlitePool,
}

impl VectorIndex {
    /// Open an existing index. Returns `None` when no index has been built
    /// yet, a normal condition the caller degrades on, not an error.
    pub async fn open(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let pool = connect(path, false).await?;
        Ok(Some(Self { pool }))
    }

    /// Create a fresh, empty index, replacing any prior one on disk.
    pub async fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Remove the old database and its WAL sidecars so the new index
        // starts from nothing.
        for suffix in ["", "-wal", "-shm"] {
            let mut os = path.as_os_str().to_owned();
            os.push(suffix);
            let p = std::path::PathBuf::from(os);
            if p.exists() {
                std::fs::remove_file(&p)
                    .with_context(|| format!("Failed to remove old index file {}", p.display()))?;
            }
        }

        let pool = connect(path, true).await?;

        sqlx::query(
            r#"
            CREATE TABLE chunks (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                page INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                hash TEXT NOT NULL,
                embedding BLOB NOT NULL,
                UNIQUE(source, chunk_index)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX idx_chunks_source ON chunks(source)")
            .execute(&pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO index_meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM index_meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Insert chunks with their embeddings. `chunks` and `embeddings` are
    /// parallel slices.
    pub async fn insert_chunks(
        &self,
        chunks: &[PageChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        anyhow::ensure!(
            chunks.len() == embeddings.len(),
            "chunk/embedding count mismatch: {} vs {}",
            chunks.len(),
            embeddings.len()
        );

        let mut tx = self.pool.begin().await?;
        for (chunk, vector) in chunks.iter().zip(embeddings.iter()) {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, page, chunk_index, text, hash, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.source)
            .bind(chunk.page)
            .bind(chunk.chunk_index)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Top-k nearest chunks by cosine similarity. With `source_filter` the
    /// candidate set is restricted to chunks whose source equals the filter
    /// exactly (no substring or fuzzy matching).
    pub async fn search(
        &self,
        query_vec: &[f32],
        top_k: usize,
        source_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let rows = match source_filter {
            Some(source) => {
                sqlx::query(
                    "SELECT id, source, page, chunk_index, text, hash, embedding \
                     FROM chunks WHERE source = ?",
                )
                .bind(source)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT id, source, page, chunk_index, text, hash, embedding FROM chunks")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let score = cosine_similarity(query_vec, &blob_to_vec(&blob));
                ScoredChunk {
                    chunk: PageChunk {
                        id: row.get("id"),
                        source: row.get("source"),
                        page: row.get("page"),
                        chunk_index: row.get("chunk_index"),
                        text: row.get("text"),
                        hash: row.get("hash"),
                    },
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    pub async fn chunk_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(create)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chunk(source: &str, page: i64, index: i64, text: &str) -> PageChunk {
        PageChunk {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            page,
            chunk_index: index,
            text: text.to_string(),
            hash: format!("{:x}", sha2::Sha256::digest(text.as_bytes())),
        }
    }

    use sha2::Digest;

    async fn seeded_index(dir: &tempfile::TempDir) -> VectorIndex {
        let path = dir.path().join("idx.sqlite");
        let index = VectorIndex::create(&path).await.unwrap();
        let chunks = vec![
            chunk("data/a.pdf", 0, 0, "alpha"),
            chunk("data/a.pdf", 1, 1, "beta"),
            chunk("data/b.pdf", 0, 0, "gamma"),
        ];
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.9, 0.1, 0.0],
        ];
        index.insert_chunks(&chunks, &embeddings).await.unwrap();
        index
    }

    #[tokio::test]
    async fn open_missing_index_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = VectorIndex::open(&dir.path().join("absent.sqlite"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn create_replaces_prior_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.sqlite");

        let first = VectorIndex::create(&path).await.unwrap();
        first
            .insert_chunks(&[chunk("data/a.pdf", 0, 0, "old")], &[vec![1.0]])
            .await
            .unwrap();
        first.close().await;

        let second = VectorIndex::create(&path).await.unwrap();
        assert_eq!(second.chunk_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn search_ranks_by_cosine() {
        let dir = tempfile::tempdir().unwrap();
        let index = seeded_index(&dir).await;

        let results = index.search(&[1.0, 0.0, 0.0], 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "alpha");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn search_with_filter_is_exact_match_only() {
        let dir = tempfile::tempdir().unwrap();
        let index = seeded_index(&dir).await;

        let results = index
            .search(&[1.0, 0.0, 0.0], 3, Some("data/b.pdf"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|r| r.chunk.source == "data/b.pdf"));

        // Substrings must not match.
        let none = index.search(&[1.0, 0.0, 0.0], 3, Some("b.pdf")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn meta_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::create(&dir.path().join("idx.sqlite"))
            .await
            .unwrap();
        index.set_meta("model", "all-MiniLM-L6-v2").await.unwrap();
        assert_eq!(
            index.get_meta("model").await.unwrap().as_deref(),
            Some("all-MiniLM-L6-v2")
        );
        assert!(index.get_meta("missing").await.unwrap().is_none());
    }
}

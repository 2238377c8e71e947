//! PDF ingestion pipeline.
//!
//! Scan → per-page extraction → chunking → embedding → fresh index write.
//! Any extraction or embedding failure aborts the run; the old index is
//! only replaced after every chunk has been embedded.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunk::split_text;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::index::VectorIndex;
use crate::models::PageChunk;
use crate::pdf;

/// Outcome of an ingestion run, with a human-readable log for display in
/// the chat client's rebuild action.
pub struct IngestReport {
    pub files: usize,
    pub pages: usize,
    pub chunks: usize,
    pub log: Vec<String>,
}

impl IngestReport {
    fn note(&mut self, line: impl Into<String>) {
        let line = line.into();
        println!("{}", line);
        self.log.push(line);
    }
}

/// Run a full ingestion over `path_override` (file or directory), falling
/// back to the configured data path. An empty corpus is a warning, not a
/// failure; unreadable PDFs and embedding errors abort the run.
pub async fn run_ingest(config: &Config, path_override: Option<&Path>) -> Result<IngestReport> {
    let scan_path = path_override.unwrap_or(&config.data.path);
    let mut report = IngestReport {
        files: 0,
        pages: 0,
        chunks: 0,
        log: Vec::new(),
    };

    let pdf_files = collect_pdfs(scan_path)?;
    if pdf_files.is_empty() {
        report.note(format!(
            "warning: no PDF files found under {}; index left untouched",
            scan_path.display()
        ));
        return Ok(report);
    }

    // Extract and chunk everything up front so a bad PDF aborts before any
    // model work or index replacement happens.
    let mut chunks: Vec<PageChunk> = Vec::new();
    for path in &pdf_files {
        let source = path.to_string_lossy().to_string();
        let pages = pdf::extract_pages(path)?;
        report.files += 1;

        let mut chunk_index: i64 = 0;
        for (page_no, page_text) in pages.iter().enumerate() {
            report.pages += 1;
            for piece in split_text(
                page_text,
                config.chunking.chunk_size,
                config.chunking.chunk_overlap,
            ) {
                chunks.push(make_chunk(&source, page_no as i64, chunk_index, piece));
                chunk_index += 1;
            }
        }
        report.note(format!(
            "read {} ({} pages, {} chunks)",
            source,
            pages.len(),
            chunk_index
        ));
    }
    report.chunks = chunks.len();

    if chunks.is_empty() {
        report.note("warning: PDFs contained no extractable text; index left untouched");
        return Ok(report);
    }

    let embedder = Embedder::new(&config.embedding)
        .await
        .context("Failed to initialize embedding model")?;
    report.note(format!(
        "embedding {} chunks with {}",
        chunks.len(),
        embedder.model_name()
    ));

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    for batch in texts.chunks(config.embedding.batch_size) {
        let vectors = embedder
            .embed(batch.to_vec())
            .await
            .context("Embedding failed")?;
        embeddings.extend(vectors);
    }

    // Only now replace the index: everything the new one needs is in hand.
    let index = VectorIndex::create(&config.index.path)
        .await
        .context("Failed to create index")?;
    index.insert_chunks(&chunks, &embeddings).await?;
    index
        .set_meta("embedding_model", embedder.model_name())
        .await?;
    index
        .set_meta("embedding_dims", &embedder.dims().to_string())
        .await?;
    index
        .set_meta("built_at", &chrono::Utc::now().to_rfc3339())
        .await?;
    index.close().await;

    report.note(format!(
        "indexed {} chunks from {} files into {}",
        report.chunks,
        report.files,
        config.index.path.display()
    ));
    Ok(report)
}

/// PDFs under `path`: the file itself, or the direct children of a
/// directory (the corpus layout is flat), sorted for determinism.
fn collect_pdfs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        anyhow::ensure!(pdf::is_pdf(path), "{} is not a PDF file", path.display());
        return Ok(vec![path.to_path_buf()]);
    }
    anyhow::ensure!(
        path.is_dir(),
        "data path {} does not exist",
        path.display()
    );

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| pdf::is_pdf(p))
        .collect();
    files.sort();
    Ok(files)
}

fn make_chunk(source: &str, page: i64, chunk_index: i64, text: String) -> PageChunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    PageChunk {
        id: Uuid::new_v4().to_string(),
        source: source.to_string(),
        page,
        chunk_index,
        text,
        hash: format!("{:x}", hasher.finalize()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.pdf"), b"x").unwrap();

        let files = collect_pdfs(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        // Flat scan only, alphabetical.
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn collect_pdfs_rejects_non_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"x").unwrap();
        assert!(collect_pdfs(&path).is_err());
    }

    #[test]
    fn collect_pdfs_missing_path_is_error() {
        assert!(collect_pdfs(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn chunk_ids_and_hashes_are_populated() {
        let chunk = make_chunk("data/a.pdf", 0, 0, "hello".to_string());
        assert!(!chunk.id.is_empty());
        assert_eq!(chunk.hash.len(), 64);
        assert_eq!(chunk.page, 0);
    }
}

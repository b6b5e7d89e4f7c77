//! PDF loading.
//!
//! Parsing is CPU-bound, so every load runs under
//! [`tokio::task::spawn_blocking`] and the async surface stays cheap to call
//! from the sequential merge loop.

use crate::error::{AssembleError, Result};
use futures::stream::{self, StreamExt};
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

/// How many loads may run at once in [`PdfReader::load_all`].
const PARALLEL_LOADS: usize = 4;

/// A successfully loaded PDF with its bookkeeping.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The parsed document.
    pub document: Document,
    /// Where it came from.
    pub path: PathBuf,
    /// Pages in the document.
    pub page_count: usize,
    /// On-disk size in bytes.
    pub file_size: u64,
    /// Time spent parsing.
    pub load_time: Duration,
}

/// Loads PDFs off the async runtime's worker threads.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single PDF.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, unparsable, encrypted, or has no
    /// pages.
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        if !path.exists() {
            return Err(AssembleError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file_size = tokio::fs::metadata(path).await?.len();
        let start = Instant::now();

        let load_path = path.to_path_buf();
        let document = task::spawn_blocking(move || Document::load(&load_path))
            .await
            .map_err(|e| AssembleError::merge_failed(format!("load task failed: {e}")))?
            .map_err(|e| AssembleError::load_failed(path, e.to_string()))?;

        if document.is_encrypted() {
            return Err(AssembleError::EncryptedPdf {
                path: path.to_path_buf(),
            });
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(AssembleError::CorruptedPdf {
                path: path.to_path_buf(),
                details: "document has no pages".to_string(),
            });
        }

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
            file_size,
            load_time: start.elapsed(),
        })
    }

    /// Load several PDFs, up to [`PARALLEL_LOADS`] at a time, preserving
    /// input order in the result.
    ///
    /// # Errors
    ///
    /// Fails on the first file that does not load.
    pub async fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<LoadedPdf>> {
        let mut loaded: Vec<(usize, LoadedPdf)> = stream::iter(paths.iter().enumerate())
            .map(|(index, path)| async move { (index, self.load(path).await) })
            .buffer_unordered(PARALLEL_LOADS)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(|(index, result)| result.map(|pdf| (index, pdf)))
            .collect::<Result<_>>()?;

        loaded.sort_by_key(|(index, _)| *index);
        Ok(loaded.into_iter().map(|(_, pdf)| pdf).collect())
    }

    /// Extract per-page text from a PDF, in page order.
    ///
    /// Pages whose text cannot be extracted yield an empty string; `limit`
    /// caps how many pages are read (content scans only need the first few).
    ///
    /// # Errors
    ///
    /// Fails when the file itself does not load.
    pub async fn page_texts(&self, path: &Path, limit: Option<usize>) -> Result<Vec<String>> {
        let loaded = self.load(path).await?;
        let document = loaded.document;

        task::spawn_blocking(move || {
            let pages = document.get_pages();
            let take = limit.unwrap_or(pages.len());
            pages
                .keys()
                .take(take)
                .map(|number| document.extract_text(&[*number]).unwrap_or_default())
                .collect()
        })
        .await
        .map_err(|e| AssembleError::merge_failed(format!("text extraction task failed: {e}")))
    }
}

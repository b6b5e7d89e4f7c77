//! PDF writing with atomic replacement.
//!
//! Documents are serialized to a temporary sibling file and renamed into
//! place, so a crash mid-write never leaves a torn output. Serialization is
//! CPU-bound and runs under `spawn_blocking` like loading does.

use crate::error::{AssembleError, Result};
use lopdf::Document;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

/// Options controlling how documents are written.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Write to a temp file and rename into place.
    pub atomic: bool,
    /// Prune unreferenced objects and compress streams before writing.
    pub optimize: bool,
    /// Replace an existing file instead of failing.
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            optimize: true,
            overwrite: false,
        }
    }
}

/// Statistics for one completed write.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Final output path.
    pub path: PathBuf,
    /// Bytes written.
    pub file_size: u64,
    /// Time spent serializing and renaming.
    pub duration: Duration,
}

/// Writes finished documents to disk.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with explicit options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Write `document` to `path`.
    ///
    /// # Errors
    ///
    /// Fails when the target exists without `overwrite`, the parent directory
    /// cannot be created, or serialization fails.
    pub async fn save(&self, document: Document, path: &Path) -> Result<WriteStatistics> {
        if path.exists() && !self.options.overwrite {
            return Err(AssembleError::OutputExists {
                path: path.to_path_buf(),
            });
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AssembleError::FailedToCreateOutput {
                        path: parent.to_path_buf(),
                        reason: e.to_string(),
                    }
                })?;
            }
        }

        let start = Instant::now();
        let options = self.options;
        let target = path.to_path_buf();

        let written: std::io::Result<()> = task::spawn_blocking(move || {
            let mut document = document;
            if options.optimize {
                document.prune_objects();
                document.renumber_objects();
                document.compress();
            }

            let write_path = if options.atomic {
                target.with_extension("pdf.tmp")
            } else {
                target.clone()
            };

            {
                let file = std::fs::File::create(&write_path)?;
                let mut writer = BufWriter::new(file);
                document
                    .save_to(&mut writer)
                    .map_err(|e| std::io::Error::other(e.to_string()))?;
            }

            if options.atomic {
                std::fs::rename(&write_path, &target)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| AssembleError::merge_failed(format!("write task failed: {e}")))?;

        written.map_err(|e| AssembleError::FailedToWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let file_size = tokio::fs::metadata(path).await?.len();
        Ok(WriteStatistics {
            path: path.to_path_buf(),
            file_size,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};
    use tempfile::TempDir;

    fn create_test_document(pages: usize) -> Document {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for _ in 0..pages {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(page_id);
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => pages as i64,
        };
        doc.objects.insert(pages_id, pages_dict.into());

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[tokio::test]
    async fn test_save_creates_file_and_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("merged").join("Unit01.pdf");

        let stats = PdfWriter::new()
            .save(create_test_document(2), &path)
            .await
            .unwrap();
        assert!(path.exists());
        assert!(stats.file_size > 0);

        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
    }

    #[tokio::test]
    async fn test_save_refuses_existing_output() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Unit01.pdf");
        std::fs::write(&path, b"occupied").unwrap();

        let result = PdfWriter::new().save(create_test_document(1), &path).await;
        assert!(matches!(result, Err(AssembleError::OutputExists { .. })));
    }

    #[tokio::test]
    async fn test_save_overwrites_when_allowed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Unit01.pdf");
        std::fs::write(&path, b"occupied").unwrap();

        let writer = PdfWriter::with_options(WriteOptions {
            overwrite: true,
            ..Default::default()
        });
        writer
            .save(create_test_document(1), &path)
            .await
            .unwrap();

        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }

    #[tokio::test]
    async fn test_atomic_save_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Unit01.pdf");

        PdfWriter::new()
            .save(create_test_document(1), &path)
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}

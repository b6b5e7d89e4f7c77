//! Plan building.
//!
//! Turns a raw book directory into a validated [`BookConfig`]: discovery,
//! classification, metadata detection, requirement filtering, boundary
//! scanning, unit-count reconciliation, review-insert resolution. The
//! pipeline never prompts; whatever it cannot decide it either defaults with
//! a recorded warning or refuses with an error the caller can override via
//! [`PlanOptions`].

use crate::config::{
    BookConfig, BookType, CategoryLayout, CategorySource, CombinedPart, ReviewInsert,
    SourceDocument,
};
use crate::detect::boundary::{BoundaryOptions, UnitBoundaryDetector};
use crate::detect::classify::{ClassifiedEntry, FileClassifier};
use crate::detect::filter::{FilterOutcome, LevelFileFilter};
use crate::detect::BookMetadataDetector;
use crate::error::{AssembleError, Result};
use crate::io::PdfReader;
use crate::walker;
use std::path::{Path, PathBuf};

/// How many documents the book-side content scan may open.
const CONTENT_SCAN_FILES: usize = 3;
/// How many pages of each the content scan reads.
const CONTENT_SCAN_PAGES: usize = 3;

/// Caller-supplied overrides and policies for plan building.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Output directory; defaults to `<book_dir>/merged`.
    pub output_dir: Option<PathBuf>,
    /// Book side override.
    pub book_type: Option<BookType>,
    /// Level override.
    pub level: Option<u32>,
    /// Book number override.
    pub book_number: Option<u32>,
    /// Unit count override; also enables the even-split fallback for files
    /// without unit markers.
    pub total_units: Option<usize>,
    /// Boundary-scan restart page, for books whose front matter repeats
    /// "Unit 1".
    pub restart_at: Option<usize>,
    /// Proceed when required categories are missing.
    pub allow_missing: bool,
}

/// A built plan plus everything worth telling the operator.
#[derive(Debug)]
pub struct PlanOutcome {
    /// The validated plan.
    pub config: BookConfig,
    /// Defaults taken and oddities noticed on the way.
    pub warnings: Vec<String>,
}

/// Builds merge plans from book directories.
#[derive(Debug, Default)]
pub struct PlanBuilder {
    reader: PdfReader,
    classifier: FileClassifier,
    boundaries: UnitBoundaryDetector,
    metadata: BookMetadataDetector,
    filter: LevelFileFilter,
}

impl PlanBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan for `book_dir`.
    ///
    /// # Errors
    ///
    /// Fails when the directory holds no PDFs, when required categories are
    /// missing without `allow_missing`, when a source fails to load, or when
    /// no unit count can be established.
    pub async fn build(&self, book_dir: &Path, options: &PlanOptions) -> Result<PlanOutcome> {
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| book_dir.join("merged"));
        let mut warnings = Vec::new();

        let pdfs = walker::find_pdfs(book_dir, Some(&output_dir))?;
        let set = self.classifier.group(&pdfs);

        let book_number = options
            .book_number
            .or_else(|| self.metadata.detect_book_number(book_dir));
        let level = options
            .level
            .or_else(|| self.metadata.detect_level(book_dir, &pdfs));
        let book_type = match options.book_type {
            Some(side) => Some(side),
            None => self.detect_book_type(book_dir, &pdfs, &set.category_names()).await,
        };
        if book_type.is_none() {
            warnings.push("book side could not be determined".to_string());
        }

        let selection = match self.filter.filter(&set, book_type, book_number) {
            FilterOutcome::Complete(selection) => selection,
            FilterOutcome::MissingRequired { missing, partial } => {
                if !options.allow_missing {
                    return Err(AssembleError::MissingCategories { names: missing });
                }
                warnings.push(format!(
                    "continuing without required categories: {}",
                    missing.join(", ")
                ));
                partial
            }
        };

        let mut merge_order = Vec::with_capacity(selection.categories.len());
        for (name, entries) in &selection.categories {
            let layout = self
                .build_layout(name, entries, options, &mut warnings)
                .await?;
            merge_order.push(CategorySource {
                name: name.clone(),
                layout,
            });
        }

        let (detected_units, reconcile_warnings) =
            BookConfig::reconcile_unit_counts(&merge_order);
        warnings.extend(reconcile_warnings);

        let total_units = options.total_units.unwrap_or(detected_units);
        if total_units == 0 {
            return Err(AssembleError::invalid_plan(
                "could not determine the unit count; pass it explicitly",
            ));
        }

        let mut review_inserts = Vec::with_capacity(set.reviews.len());
        for review in &set.reviews {
            let loaded = self.reader.load(&review.path).await?;
            let end_unit = review
                .end_unit
                .map(|u| u as usize)
                .unwrap_or(total_units)
                .clamp(1, total_units);
            let start_unit = review
                .start_unit
                .map(|u| u as usize)
                .unwrap_or(end_unit)
                .clamp(1, end_unit);
            if review.end_unit.is_none() {
                warnings.push(format!(
                    "{}: no unit range in the name, inserting after unit {end_unit}",
                    loaded.path.display()
                ));
            }
            review_inserts.push(ReviewInsert {
                document: SourceDocument::new(loaded.path, loaded.page_count),
                start_unit,
                end_unit,
            });
        }

        let config = BookConfig {
            book_dir: book_dir.to_path_buf(),
            output_dir,
            book_type,
            level,
            book_number,
            total_units,
            merge_order,
            review_inserts,
        };
        config.validate()?;

        Ok(PlanOutcome { config, warnings })
    }

    /// Detection ladder for the book side, cheapest first.
    async fn detect_book_type(
        &self,
        book_dir: &Path,
        pdfs: &[PathBuf],
        category_names: &[&str],
    ) -> Option<BookType> {
        if let Some(side) = self.metadata.side_from_names(book_dir, pdfs) {
            return Some(side);
        }
        if let Some(side) = self.metadata.side_from_structure(category_names) {
            return Some(side);
        }
        for path in pdfs.iter().take(CONTENT_SCAN_FILES) {
            let Ok(texts) = self
                .reader
                .page_texts(path, Some(CONTENT_SCAN_PAGES))
                .await
            else {
                continue;
            };
            if let Some(side) = self.metadata.side_from_text(&texts.join(" ")) {
                return Some(side);
            }
        }
        None
    }

    /// Choose a layout for one category's files.
    async fn build_layout(
        &self,
        name: &str,
        entries: &[ClassifiedEntry],
        options: &PlanOptions,
        warnings: &mut Vec<String>,
    ) -> Result<CategoryLayout> {
        if entries.len() == 1 {
            return self
                .scan_single(name, &entries[0].path, options, warnings)
                .await;
        }

        let with_unit: Vec<&ClassifiedEntry> =
            entries.iter().filter(|e| e.unit.is_some()).collect();

        if with_unit.is_empty() {
            return self.chain_parts(name, entries, warnings).await;
        }

        if with_unit.len() < entries.len() {
            // Per-unit files win over an all-in-one companion.
            for entry in entries.iter().filter(|e| e.unit.is_none()) {
                warnings.push(format!(
                    "{name}: ignoring {} in favor of the per-unit files",
                    entry.path.display()
                ));
            }
        }

        self.unit_indexed(name, &with_unit, warnings).await
    }

    /// One file for the whole category: find the units inside it.
    async fn scan_single(
        &self,
        name: &str,
        path: &Path,
        options: &PlanOptions,
        warnings: &mut Vec<String>,
    ) -> Result<CategoryLayout> {
        let texts = self.reader.page_texts(path, None).await?;
        let page_count = texts.len();

        let scan = self.boundaries.scan(
            &texts,
            &BoundaryOptions {
                restart_at: options.restart_at,
                fallback_units: options.total_units,
            },
        );

        if scan.restart_candidates.len() > 1 && options.restart_at.is_none() {
            warnings.push(format!(
                "{name}: unit 1 appears at pages {:?} of {}; keeping the first (restart page overrides this)",
                scan.restart_candidates,
                path.display(),
            ));
        }

        let document = SourceDocument::new(path, page_count);

        if scan.is_empty() {
            warnings.push(format!(
                "{name}: no unit markers in {}, treating it as a single unit",
                path.display()
            ));
            return Ok(CategoryLayout::Segmented {
                document,
                unit_lengths: vec![page_count],
            });
        }

        if scan.used_fallback {
            warnings.push(format!(
                "{name}: no unit markers in {}, split evenly into {} units",
                path.display(),
                scan.unit_count()
            ));
        } else if !scan.ordered {
            warnings.push(format!(
                "{name}: unit numbers in {} are not 1..{} in order",
                path.display(),
                scan.unit_count()
            ));
        }

        Ok(CategoryLayout::Segmented {
            document,
            unit_lengths: scan.unit_lengths,
        })
    }

    /// One file per unit.
    async fn unit_indexed(
        &self,
        name: &str,
        entries: &[&ClassifiedEntry],
        warnings: &mut Vec<String>,
    ) -> Result<CategoryLayout> {
        // Entries arrive sorted by unit; collapse duplicates, first wins.
        let mut chosen: Vec<&ClassifiedEntry> = Vec::with_capacity(entries.len());
        for entry in entries.iter().copied() {
            if chosen.last().map(|c| c.unit) == Some(entry.unit) {
                warnings.push(format!(
                    "{name}: duplicate unit {:?}, ignoring {}",
                    entry.unit,
                    entry.path.display()
                ));
                continue;
            }
            chosen.push(entry);
        }

        let contiguous = chosen
            .iter()
            .enumerate()
            .all(|(i, e)| e.unit == Some(i as u32 + 1));
        if !contiguous {
            warnings.push(format!(
                "{name}: unit numbers are not contiguous from 1, using files in order"
            ));
        }

        let paths: Vec<PathBuf> = chosen.iter().map(|e| e.path.clone()).collect();
        let documents = self
            .reader
            .load_all(&paths)
            .await?
            .into_iter()
            .map(|loaded| SourceDocument::new(loaded.path, loaded.page_count))
            .collect();

        Ok(CategoryLayout::UnitIndexed { documents })
    }

    /// Several files, none unit-numbered: scan each and chain them.
    async fn chain_parts(
        &self,
        name: &str,
        entries: &[ClassifiedEntry],
        warnings: &mut Vec<String>,
    ) -> Result<CategoryLayout> {
        let mut parts = Vec::with_capacity(entries.len());
        let mut next_start = 1usize;

        for entry in entries {
            let texts = self.reader.page_texts(&entry.path, None).await?;
            let page_count = texts.len();
            let scan = self
                .boundaries
                .scan(&texts, &BoundaryOptions::default());

            let unit_lengths = if scan.is_empty() {
                warnings.push(format!(
                    "{name}: no unit markers in {}, treating it as one unit",
                    entry.path.display()
                ));
                vec![page_count]
            } else {
                scan.unit_lengths
            };

            let covered = unit_lengths.len();
            parts.push(CombinedPart {
                document: SourceDocument::new(&entry.path, page_count),
                start_unit: next_start,
                unit_lengths,
            });
            next_start += covered;
        }

        Ok(CategoryLayout::Combined { parts })
    }
}

//! The unit merge engine.
//!
//! Walks units `1..=total_units`; for each, pulls one page slice per category
//! in merge order, appends any review insert whose end unit matches, and
//! writes `Unit<NN>.pdf`. Failures are scoped: a category with nothing for a
//! unit is skipped with a log entry, a unit that collects no pages at all is
//! a failed unit, and the run always continues to the next one.

use crate::config::{BookConfig, CategoryLayout};
use crate::error::{AssembleError, Result};
use crate::io::{PdfReader, PdfWriter, WriteOptions};
use crate::merge::pages::{DocumentAssembler, PageSlice};
use crate::output::{format_file_size, OutputFormatter};
use crate::report::RunLog;
use lopdf::Document;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Where one category's pages for one unit come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SliceOutcome {
    /// The whole document at `path`.
    Whole { path: PathBuf },
    /// A page slice of the document at `path`.
    Slice {
        path: PathBuf,
        slice: PageSlice,
        /// Pages clamped off the end because the document was short.
        truncated_by: usize,
    },
    /// The category has no material for this unit.
    NotFound,
    /// The slice starts at or past the document's last page.
    RangeExceeded {
        path: PathBuf,
        start: usize,
        total: usize,
    },
}

/// Resolve the page source for `unit` under `layout`.
///
/// `page_counts` maps each source path to its page count as loaded, which
/// wins over the count recorded in the plan.
pub(crate) fn slice_for_unit(
    layout: &CategoryLayout,
    unit: usize,
    page_counts: &HashMap<PathBuf, usize>,
) -> SliceOutcome {
    let actual = |path: &PathBuf, recorded: usize| -> usize {
        page_counts.get(path).copied().unwrap_or(recorded)
    };

    match layout {
        CategoryLayout::UnitIndexed { documents } => match documents.get(unit - 1) {
            Some(doc) => SliceOutcome::Whole {
                path: doc.path.clone(),
            },
            None => SliceOutcome::NotFound,
        },
        CategoryLayout::Monolithic {
            document,
            pages_per_unit,
        } => {
            let total = actual(&document.path, document.page_count);
            let start = (unit - 1) * pages_per_unit;
            if start >= total {
                return SliceOutcome::RangeExceeded {
                    path: document.path.clone(),
                    start,
                    total,
                };
            }
            let end = unit * pages_per_unit;
            SliceOutcome::Slice {
                path: document.path.clone(),
                slice: PageSlice::new(start, end.min(total)),
                truncated_by: end.saturating_sub(total),
            }
        }
        CategoryLayout::Segmented {
            document,
            unit_lengths,
        } => segment_slice(
            &document.path,
            unit_lengths,
            unit - 1,
            actual(&document.path, document.page_count),
        ),
        CategoryLayout::Combined { parts } => {
            let Some(part) = parts
                .iter()
                .find(|p| p.start_unit <= unit && unit <= p.end_unit())
            else {
                return SliceOutcome::NotFound;
            };
            segment_slice(
                &part.document.path,
                &part.unit_lengths,
                unit - part.start_unit,
                actual(&part.document.path, part.document.page_count),
            )
        }
    }
}

fn segment_slice(
    path: &PathBuf,
    unit_lengths: &[usize],
    local_index: usize,
    total: usize,
) -> SliceOutcome {
    let Some(&length) = unit_lengths.get(local_index) else {
        return SliceOutcome::NotFound;
    };
    if length == 0 {
        return SliceOutcome::NotFound;
    }

    let start: usize = unit_lengths[..local_index].iter().sum();
    if start >= total {
        return SliceOutcome::RangeExceeded {
            path: path.clone(),
            start,
            total,
        };
    }

    let end = start + length;
    SliceOutcome::Slice {
        path: path.clone(),
        slice: PageSlice::new(start, end.min(total)),
        truncated_by: end.saturating_sub(total),
    }
}

/// Statistics for one assembly run.
#[derive(Debug, Clone, Default)]
pub struct MergeStatistics {
    /// Units the plan called for.
    pub units_total: usize,
    /// Units written successfully.
    pub units_succeeded: usize,
    /// Units that produced no output.
    pub units_failed: usize,
    /// Pages across all written unit files.
    pub pages_written: usize,
    /// Output files written, combined book included.
    pub files_written: usize,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

/// Result of assembling one unit.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    /// Unit number, 1-based.
    pub unit: usize,
    /// Written file, or `None` when the unit failed.
    pub output: Option<PathBuf>,
    /// Pages in the written file.
    pub pages: usize,
    /// Categories that contributed nothing for this unit.
    pub skipped: Vec<String>,
}

/// Result of a whole run.
#[derive(Debug)]
pub struct MergeRunResult {
    /// Aggregate statistics.
    pub statistics: MergeStatistics,
    /// Per-unit outcomes, in unit order.
    pub units: Vec<UnitOutcome>,
    /// Combined book file, when requested and at least one unit existed.
    pub combined: Option<PathBuf>,
    /// The written merge report.
    pub report_path: PathBuf,
}

impl MergeRunResult {
    /// Whether every unit was produced.
    pub fn succeeded(&self) -> bool {
        self.statistics.units_failed == 0
    }
}

/// Assembles unit files from a validated plan.
pub struct UnitMergeEngine {
    reader: PdfReader,
    writer: PdfWriter,
    assembler: DocumentAssembler,
}

impl UnitMergeEngine {
    /// Create an engine. `force` lets outputs replace existing files.
    pub fn new(force: bool) -> Self {
        Self {
            reader: PdfReader::new(),
            writer: PdfWriter::with_options(WriteOptions {
                overwrite: force,
                ..Default::default()
            }),
            assembler: DocumentAssembler::new(),
        }
    }

    /// Run the full assembly.
    ///
    /// Sources are loaded once and reused across units. The merge report is
    /// written to the output directory whatever the outcome; inspect
    /// [`MergeRunResult::succeeded`] for the verdict.
    ///
    /// # Errors
    ///
    /// Fails on plan validation errors, unloadable sources, and output
    /// errors (existing files without `force`, unwritable directory).
    /// Per-unit extraction problems are logged and do not abort the run.
    pub async fn run(
        &self,
        config: &BookConfig,
        combine: bool,
        log: &mut RunLog,
        formatter: &OutputFormatter,
    ) -> Result<MergeRunResult> {
        config.validate()?;
        let started = Instant::now();

        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|e| AssembleError::FailedToCreateOutput {
                path: config.output_dir.clone(),
                reason: e.to_string(),
            })?;

        let (documents, page_counts) = self.load_sources(config).await?;
        log.info(format!("loaded {} source files", documents.len()));

        let mut statistics = MergeStatistics {
            units_total: config.total_units,
            ..Default::default()
        };
        let mut units = Vec::with_capacity(config.total_units);

        for unit in 1..=config.total_units {
            formatter.progress(
                unit,
                config.total_units,
                Some(&format!("Unit {unit:02}")),
            );
            let outcome = self
                .merge_unit(config, unit, &documents, &page_counts, log)
                .await?;
            if outcome.output.is_some() {
                statistics.units_succeeded += 1;
                statistics.files_written += 1;
                statistics.pages_written += outcome.pages;
            } else {
                statistics.units_failed += 1;
            }
            units.push(outcome);
        }

        let combined = if combine {
            let path = self.combine_units(config, &units, log).await?;
            if path.is_some() {
                statistics.files_written += 1;
            }
            path
        } else {
            None
        };

        statistics.duration = started.elapsed();
        let report_path = log.save(&config.output_dir, &statistics).await?;

        Ok(MergeRunResult {
            statistics,
            units,
            combined,
            report_path,
        })
    }

    /// Load every referenced source exactly once.
    async fn load_sources(
        &self,
        config: &BookConfig,
    ) -> Result<(HashMap<PathBuf, Document>, HashMap<PathBuf, usize>)> {
        let mut seen = HashSet::new();
        let unique: Vec<PathBuf> = config
            .all_documents()
            .into_iter()
            .map(|d| d.path.clone())
            .filter(|p| seen.insert(p.clone()))
            .collect();

        let mut documents = HashMap::new();
        let mut page_counts = HashMap::new();
        for loaded in self.reader.load_all(&unique).await? {
            page_counts.insert(loaded.path.clone(), loaded.page_count);
            documents.insert(loaded.path, loaded.document);
        }
        Ok((documents, page_counts))
    }

    async fn merge_unit(
        &self,
        config: &BookConfig,
        unit: usize,
        documents: &HashMap<PathBuf, Document>,
        page_counts: &HashMap<PathBuf, usize>,
        log: &mut RunLog,
    ) -> Result<UnitOutcome> {
        let mut assembled: Option<Document> = None;
        let mut pages = 0usize;
        let mut skipped = Vec::new();

        for category in &config.merge_order {
            match slice_for_unit(&category.layout, unit, page_counts) {
                SliceOutcome::NotFound => {
                    log.info(format!("unit {unit}: no {} material", category.name));
                    skipped.push(category.name.clone());
                }
                SliceOutcome::RangeExceeded { path, start, total } => {
                    log.error(format!(
                        "unit {unit}: {} slice starts at page {start} but {} has only {total} pages",
                        category.name,
                        file_label(&path),
                    ));
                    skipped.push(category.name.clone());
                }
                SliceOutcome::Whole { path } => {
                    let Some(document) = documents.get(&path) else {
                        log.error(format!("unit {unit}: {} was not loaded", file_label(&path)));
                        skipped.push(category.name.clone());
                        continue;
                    };
                    let count = self.assembler.page_count(document);
                    match self.assembler.append(&mut assembled, document.clone()) {
                        Ok(()) => pages += count,
                        Err(e) => {
                            log.error(format!("unit {unit}: {}: {e}", category.name));
                            skipped.push(category.name.clone());
                        }
                    }
                }
                SliceOutcome::Slice {
                    path,
                    slice,
                    truncated_by,
                } => {
                    if truncated_by > 0 {
                        log.warning(format!(
                            "unit {unit}: {} runs {truncated_by} pages past the end of {}, truncating",
                            category.name,
                            file_label(&path),
                        ));
                    }
                    let Some(document) = documents.get(&path) else {
                        log.error(format!("unit {unit}: {} was not loaded", file_label(&path)));
                        skipped.push(category.name.clone());
                        continue;
                    };
                    let spliced = self
                        .assembler
                        .extract_slice(document, &slice)
                        .and_then(|part| self.assembler.append(&mut assembled, part));
                    match spliced {
                        Ok(()) => pages += slice.len(),
                        Err(e) => {
                            log.error(format!("unit {unit}: {}: {e}", category.name));
                            skipped.push(category.name.clone());
                        }
                    }
                }
            }
        }

        for review in config.review_inserts.iter().filter(|r| r.end_unit == unit) {
            let Some(document) = documents.get(&review.document.path) else {
                log.error(format!(
                    "unit {unit}: review {} was not loaded",
                    review.document.display_name()
                ));
                continue;
            };
            let count = self.assembler.page_count(document);
            match self.assembler.append(&mut assembled, document.clone()) {
                Ok(()) => {
                    pages += count;
                    log.info(format!(
                        "unit {unit}: appended review {} ({count} pages)",
                        review.document.display_name()
                    ));
                }
                Err(e) => log.error(format!(
                    "unit {unit}: review {}: {e}",
                    review.document.display_name()
                )),
            }
        }

        let Some(mut document) = assembled else {
            log.error(format!("unit {unit} produced no pages"));
            return Ok(UnitOutcome {
                unit,
                output: None,
                pages: 0,
                skipped,
            });
        };

        self.assembler.finalize(&mut document);
        let path = config.unit_output_path(unit);
        let write_stats = self.writer.save(document, &path).await?;
        log.info(format!(
            "unit {unit}: wrote {} ({pages} pages, {})",
            file_label(&path),
            format_file_size(write_stats.file_size),
        ));

        Ok(UnitOutcome {
            unit,
            output: Some(path),
            pages,
            skipped,
        })
    }

    /// Concatenate written unit files into `AllUnits.pdf`, skipping units
    /// that failed.
    async fn combine_units(
        &self,
        config: &BookConfig,
        units: &[UnitOutcome],
        log: &mut RunLog,
    ) -> Result<Option<PathBuf>> {
        let mut target: Option<Document> = None;

        for outcome in units {
            match &outcome.output {
                Some(path) => {
                    let loaded = self.reader.load(path).await?;
                    self.assembler.append(&mut target, loaded.document)?;
                }
                None => log.warning(format!(
                    "combined book skips unit {} (not produced)",
                    outcome.unit
                )),
            }
        }

        let Some(mut document) = target else {
            log.warning("no unit files to combine");
            return Ok(None);
        };

        self.assembler.finalize(&mut document);
        let path = config.combined_output_path();
        let write_stats = self.writer.save(document, &path).await?;
        log.info(format!(
            "wrote {} ({})",
            file_label(&path),
            format_file_size(write_stats.file_size),
        ));
        Ok(Some(path))
    }
}

fn file_label(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

//! Merge plan model.
//!
//! A [`BookConfig`] is the complete, serializable description of one assembly
//! run: which source documents feed each category, how each category maps its
//! pages onto units, where review inserts land, and where outputs go. Plans
//! are built by the planning pipeline or loaded from JSON, then validated
//! before any page is touched.

use crate::error::{AssembleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Which side of a two-sided study book this directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookType {
    /// Listening comprehension side (LC).
    Listening,
    /// Reading comprehension side (RC).
    Reading,
}

impl BookType {
    /// Short label used in filenames and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Listening => "LC",
            Self::Reading => "RC",
        }
    }
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A source PDF with its page count as recorded at plan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Path to the PDF.
    pub path: PathBuf,
    /// Number of pages the file had when the plan was built.
    pub page_count: usize,
}

impl SourceDocument {
    /// Create a source document record.
    pub fn new(path: impl Into<PathBuf>, page_count: usize) -> Self {
        Self {
            path: path.into(),
            page_count,
        }
    }

    /// File name for messages, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// One file of a combined category, covering a contiguous run of units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedPart {
    /// The file providing these units.
    pub document: SourceDocument,
    /// First unit (1-based) this part covers.
    pub start_unit: usize,
    /// Page length of each unit in this part, in unit order.
    pub unit_lengths: Vec<usize>,
}

impl CombinedPart {
    /// Last unit (1-based, inclusive) this part covers.
    pub fn end_unit(&self) -> usize {
        self.start_unit + self.unit_lengths.len().saturating_sub(1)
    }
}

/// How a category's pages map onto units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CategoryLayout {
    /// One whole file per unit, ordered by unit.
    UnitIndexed {
        /// Files in unit order; index `u - 1` serves unit `u`.
        documents: Vec<SourceDocument>,
    },
    /// A single file sliced into fixed-size runs of pages.
    Monolithic {
        /// The file holding every unit.
        document: SourceDocument,
        /// Pages each unit occupies.
        pages_per_unit: usize,
    },
    /// A single file with an explicit page length per unit.
    Segmented {
        /// The file holding every unit.
        document: SourceDocument,
        /// Page length of unit `u` at index `u - 1`.
        unit_lengths: Vec<usize>,
    },
    /// Several files that together cover the unit range.
    Combined {
        /// Parts in ascending `start_unit` order.
        parts: Vec<CombinedPart>,
    },
}

impl CategoryLayout {
    /// How many units this layout can serve.
    ///
    /// For fixed-size slicing this is the number of complete runs that fit in
    /// the document; a trailing partial run still counts since it is merged
    /// (truncated) with a warning.
    pub fn unit_capacity(&self) -> usize {
        match self {
            Self::UnitIndexed { documents } => documents.len(),
            Self::Monolithic {
                document,
                pages_per_unit,
            } => {
                if *pages_per_unit == 0 {
                    0
                } else {
                    document.page_count.div_ceil(*pages_per_unit)
                }
            }
            Self::Segmented { unit_lengths, .. } => unit_lengths.len(),
            Self::Combined { parts } => parts.iter().map(CombinedPart::end_unit).max().unwrap_or(0),
        }
    }

    /// All source documents referenced by this layout.
    pub fn documents(&self) -> Vec<&SourceDocument> {
        match self {
            Self::UnitIndexed { documents } => documents.iter().collect(),
            Self::Monolithic { document, .. } | Self::Segmented { document, .. } => {
                vec![document]
            }
            Self::Combined { parts } => parts.iter().map(|p| &p.document).collect(),
        }
    }
}

/// A named category and its page layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySource {
    /// Canonical category name, e.g. "Word List".
    pub name: String,
    /// How the category's pages map onto units.
    pub layout: CategoryLayout,
}

/// A review-test document inserted after its end unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInsert {
    /// The review file, appended in full.
    pub document: SourceDocument,
    /// First unit the review covers (1-based).
    pub start_unit: usize,
    /// Unit after which the review is inserted (1-based, inclusive).
    pub end_unit: usize,
}

/// Complete description of one assembly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookConfig {
    /// Book directory the sources came from.
    pub book_dir: PathBuf,
    /// Directory receiving `Unit<NN>.pdf`, `AllUnits.pdf` and the report.
    pub output_dir: PathBuf,
    /// Detected or overridden book side.
    pub book_type: Option<BookType>,
    /// Detected or overridden level.
    pub level: Option<u32>,
    /// Detected or overridden book number (drives category requirements).
    pub book_number: Option<u32>,
    /// Number of units to produce.
    pub total_units: usize,
    /// Categories in merge order.
    pub merge_order: Vec<CategorySource>,
    /// Review inserts, keyed by their end unit at merge time.
    pub review_inserts: Vec<ReviewInsert>,
}

impl BookConfig {
    /// Validate plan invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError::InvalidPlan`] when the unit count is zero,
    /// the merge order is empty or has duplicate names, a layout is
    /// internally inconsistent, or a review range falls outside
    /// `1..=total_units`.
    pub fn validate(&self) -> Result<()> {
        if self.total_units == 0 {
            return Err(AssembleError::invalid_plan("total units must be at least 1"));
        }
        if self.merge_order.is_empty() {
            return Err(AssembleError::invalid_plan("merge order is empty"));
        }

        let mut seen = HashSet::new();
        for category in &self.merge_order {
            if !seen.insert(category.name.as_str()) {
                return Err(AssembleError::invalid_plan(format!(
                    "duplicate category in merge order: {}",
                    category.name
                )));
            }
            Self::validate_layout(&category.name, &category.layout)?;
        }

        for review in &self.review_inserts {
            if review.start_unit == 0 || review.end_unit == 0 {
                return Err(AssembleError::invalid_plan(format!(
                    "review insert {} has a zero unit index",
                    review.document.display_name()
                )));
            }
            if review.start_unit > review.end_unit {
                return Err(AssembleError::invalid_plan(format!(
                    "review insert {} has start unit {} after end unit {}",
                    review.document.display_name(),
                    review.start_unit,
                    review.end_unit
                )));
            }
            if review.end_unit > self.total_units {
                return Err(AssembleError::invalid_plan(format!(
                    "review insert {} targets unit {} but the book has {} units",
                    review.document.display_name(),
                    review.end_unit,
                    self.total_units
                )));
            }
        }

        Ok(())
    }

    fn validate_layout(name: &str, layout: &CategoryLayout) -> Result<()> {
        match layout {
            CategoryLayout::UnitIndexed { documents } => {
                if documents.is_empty() {
                    return Err(AssembleError::invalid_plan(format!(
                        "category {name} has no documents"
                    )));
                }
            }
            CategoryLayout::Monolithic { pages_per_unit, .. } => {
                if *pages_per_unit == 0 {
                    return Err(AssembleError::invalid_plan(format!(
                        "category {name} has zero pages per unit"
                    )));
                }
            }
            CategoryLayout::Segmented { unit_lengths, .. } => {
                if unit_lengths.is_empty() {
                    return Err(AssembleError::invalid_plan(format!(
                        "category {name} has no unit lengths"
                    )));
                }
            }
            CategoryLayout::Combined { parts } => {
                if parts.is_empty() {
                    return Err(AssembleError::invalid_plan(format!(
                        "category {name} has no parts"
                    )));
                }
                let mut next_start = 1;
                for part in parts {
                    if part.unit_lengths.is_empty() {
                        return Err(AssembleError::invalid_plan(format!(
                            "category {name}: part {} covers no units",
                            part.document.display_name()
                        )));
                    }
                    if part.start_unit != next_start {
                        return Err(AssembleError::invalid_plan(format!(
                            "category {name}: part {} starts at unit {} but unit {} was expected",
                            part.document.display_name(),
                            part.start_unit,
                            next_start
                        )));
                    }
                    next_start = part.end_unit() + 1;
                }
            }
        }
        Ok(())
    }

    /// Reconcile unit counts across categories.
    ///
    /// Categories that cover fewer units than the widest one are kept as-is;
    /// the run merges what they have and logs the shortfall. Returns the
    /// agreed unit count and a warning per disagreeing category.
    pub fn reconcile_unit_counts(categories: &[CategorySource]) -> (usize, Vec<String>) {
        let total = categories
            .iter()
            .map(|c| c.layout.unit_capacity())
            .max()
            .unwrap_or(0);

        let warnings = categories
            .iter()
            .filter(|c| c.layout.unit_capacity() != total)
            .map(|c| {
                format!(
                    "category {} covers {} units, using {} from the widest category",
                    c.name,
                    c.layout.unit_capacity(),
                    total
                )
            })
            .collect();

        (total, warnings)
    }

    /// Every source document referenced by the plan, categories then reviews.
    pub fn all_documents(&self) -> Vec<&SourceDocument> {
        let mut docs: Vec<&SourceDocument> = self
            .merge_order
            .iter()
            .flat_map(|c| c.layout.documents())
            .collect();
        docs.extend(self.review_inserts.iter().map(|r| &r.document));
        docs
    }

    /// Output path for one unit file.
    pub fn unit_output_path(&self, unit: usize) -> PathBuf {
        self.output_dir.join(format!("Unit{unit:02}.pdf"))
    }

    /// Output path for the combined book file.
    pub fn combined_output_path(&self) -> PathBuf {
        self.output_dir.join("AllUnits.pdf")
    }
}

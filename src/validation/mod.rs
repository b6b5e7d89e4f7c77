//! Pre-flight plan validation.
//!
//! Runs before any output is touched: structural checks on the plan itself,
//! then a pass over every referenced file. Problems are collected rather than
//! returned at the first hit, so the operator sees the whole picture at once.
//! Errors block the merge; warnings accompany it into the run log.

use crate::config::BookConfig;
use crate::error::Result;
use crate::io::PdfReader;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    /// The merge may proceed.
    Warning,
    /// The merge must not proceed.
    Error,
}

/// One validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Severity.
    pub level: IssueLevel,
    /// Human-readable description.
    pub message: String,
}

/// Everything found while validating one plan.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Findings in discovery order.
    pub issues: Vec<ValidationIssue>,
    /// Actual page counts of the files that loaded.
    pub page_counts: HashMap<PathBuf, usize>,
}

impl ValidationReport {
    fn warn(&mut self, message: String) {
        self.issues.push(ValidationIssue {
            level: IssueLevel::Warning,
            message,
        });
    }

    fn fail(&mut self, message: String) {
        self.issues.push(ValidationIssue {
            level: IssueLevel::Error,
            message,
        });
    }

    /// Error findings.
    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.level == IssueLevel::Error)
            .collect()
    }

    /// Warning findings.
    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.level == IssueLevel::Warning)
            .collect()
    }

    /// Whether the merge may proceed.
    pub fn is_ok(&self) -> bool {
        self.errors().is_empty()
    }
}

/// Validates plans against the filesystem.
#[derive(Debug, Default)]
pub struct PlanValidator {
    reader: PdfReader,
}

impl PlanValidator {
    /// Create a validator.
    pub fn new() -> Self {
        Self {
            reader: PdfReader::new(),
        }
    }

    /// Validate `config` and its referenced files.
    ///
    /// # Errors
    ///
    /// Only structural plan errors surface as `Err` (they mean the plan
    /// cannot even be interpreted); everything else lands in the report.
    pub async fn validate(&self, config: &BookConfig) -> Result<ValidationReport> {
        config.validate()?;

        let mut report = ValidationReport::default();

        for document in config.all_documents() {
            if report.page_counts.contains_key(&document.path) {
                continue;
            }
            if !document.path.exists() {
                report.fail(format!("missing file: {}", document.path.display()));
                continue;
            }
            match self.reader.load(&document.path).await {
                Ok(loaded) => {
                    if loaded.page_count != document.page_count {
                        report.warn(format!(
                            "{}: plan recorded {} pages but the file has {}",
                            document.display_name(),
                            document.page_count,
                            loaded.page_count,
                        ));
                    }
                    report.page_counts.insert(document.path.clone(), loaded.page_count);
                }
                Err(e) => report.fail(e.to_string()),
            }
        }

        for category in &config.merge_order {
            let capacity = category.layout.unit_capacity();
            if capacity < config.total_units {
                report.warn(format!(
                    "category {} covers {capacity} of {} units",
                    category.name, config.total_units,
                ));
            }
        }

        Ok(report)
    }
}

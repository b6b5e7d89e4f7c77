//! unitbind - Assemble per-unit study PDFs from a book directory.
//!
//! A study book arrives as a pile of PDFs: per-unit worksheets, monolithic
//! all-unit files, review tests, answer keys. This library classifies them,
//! detects where each unit starts and ends, and merges one output PDF per
//! unit, with an optional combined book and a merge report.
//!
//! # Examples
//!
//! ## Plan and merge a book directory
//!
//! ```no_run
//! use unitbind::merge::UnitMergeEngine;
//! use unitbind::output::OutputFormatter;
//! use unitbind::pipeline::{PlanBuilder, PlanOptions};
//! use unitbind::report::RunLog;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let outcome = PlanBuilder::new()
//!     .build(Path::new("books/reading_45"), &PlanOptions::default())
//!     .await?;
//!
//! let engine = UnitMergeEngine::new(false);
//! let mut log = RunLog::new();
//! let result = engine
//!     .run(&outcome.config, true, &mut log, &OutputFormatter::quiet())
//!     .await?;
//! println!("wrote {} files", result.statistics.files_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use unitbind::detect::boundary::{BoundaryOptions, UnitBoundaryDetector};
//! use unitbind::io::PdfReader;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let texts = reader.page_texts(Path::new("unit_tests.pdf"), None).await?;
//!
//! let detector = UnitBoundaryDetector::new();
//! let scan = detector.scan(&texts, &BoundaryOptions::default());
//! println!("found {} units", scan.unit_count());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod io;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod validation;
pub mod walker;

// Re-export commonly used types
pub use config::BookConfig;
pub use error::{AssembleError, Result};

use cli::Cli;
use merge::UnitMergeEngine;
use output::OutputFormatter;
use pipeline::PlanBuilder;
use report::RunLog;
use validation::PlanValidator;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the full assembly from parsed arguments.
///
/// # Errors
///
/// Returns the first blocking error: invalid arguments, an unbuildable or
/// invalid plan, validation errors, output collisions, or a run where any
/// unit failed.
pub async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;
    let formatter = cli.formatter();

    if formatter.should_print() {
        formatter.section(&format!("{NAME} v{VERSION}"));
        formatter.blank_line();
    }

    let (config, plan_warnings) = match &cli.plan {
        Some(path) => (load_plan(&cli, path).await?, Vec::new()),
        None => {
            formatter.info("Building merge plan...");
            let outcome = PlanBuilder::new()
                .build(&cli.book_dir, &cli.plan_options())
                .await?;
            (outcome.config, outcome.warnings)
        }
    };

    for warning in &plan_warnings {
        formatter.warning(warning);
    }

    if let Some(path) = &cli.emit_plan {
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| AssembleError::invalid_plan(format!("plan is not serializable: {e}")))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| AssembleError::FailedToWrite {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        formatter.success(&format!("Plan written to {}", path.display()));
    }

    formatter.info("Validating plan...");
    let report = PlanValidator::new().validate(&config).await?;
    for issue in report.warnings() {
        formatter.warning(&issue.message);
    }
    for issue in report.errors() {
        formatter.error(&issue.message);
    }
    if !report.is_ok() {
        return Err(AssembleError::invalid_plan(format!(
            "{} validation error(s)",
            report.errors().len()
        )));
    }

    // --emit-plan produces a plan for later editing; merging is a separate run.
    if cli.dry_run || cli.emit_plan.is_some() {
        display_plan(&formatter, &config);
        formatter.blank_line();
        formatter.success("Plan validated successfully");
        if cli.emit_plan.is_none() {
            formatter.info("  Run without --dry-run to merge");
        }
        return Ok(());
    }

    let mut log = RunLog::new();
    for warning in &plan_warnings {
        log.warning(warning.clone());
    }
    for issue in report.warnings() {
        log.warning(issue.message.clone());
    }

    formatter.info("Merging units...");
    let engine = UnitMergeEngine::new(cli.force);
    let result = engine.run(&config, cli.combine, &mut log, &formatter).await?;

    if formatter.should_print() {
        formatter.blank_line();
        formatter.success(&format!(
            "Wrote {} file(s), {} pages, in {:.2}s",
            result.statistics.files_written,
            result.statistics.pages_written,
            result.statistics.duration.as_secs_f64(),
        ));
        formatter.info(&format!("Report: {}", result.report_path.display()));

        if formatter.is_verbose() {
            formatter.blank_line();
            formatter.section("Units");
            for outcome in &result.units {
                match &outcome.output {
                    Some(path) => formatter.list_item(
                        outcome.unit,
                        &format!("{} ({} pages)", path.display(), outcome.pages),
                    ),
                    None => formatter.list_item(outcome.unit, "failed"),
                }
            }
        }
    }

    if !result.succeeded() {
        return Err(AssembleError::merge_failed(format!(
            "{} of {} units failed; see {}",
            result.statistics.units_failed,
            result.statistics.units_total,
            result.report_path.display(),
        )));
    }

    Ok(())
}

/// Load a JSON plan and apply the command-line overrides on top.
async fn load_plan(cli: &Cli, path: &std::path::Path) -> Result<BookConfig> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AssembleError::invalid_plan(format!("failed to read {}: {e}", path.display())))?;
    let mut config: BookConfig = serde_json::from_str(&raw)
        .map_err(|e| AssembleError::invalid_plan(format!("{}: {e}", path.display())))?;

    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(units) = cli.units {
        config.total_units = units;
    }
    if let Some(side) = cli.book_type {
        config.book_type = Some(side.into());
    }
    if let Some(level) = cli.level {
        config.level = Some(level);
    }
    if let Some(number) = cli.book_number {
        config.book_number = Some(number);
    }
    Ok(config)
}

fn display_plan(formatter: &OutputFormatter, config: &BookConfig) {
    formatter.blank_line();
    formatter.section("Plan");
    formatter.info(&format!(
        "  Book: {} ({}, level {}, number {})",
        config.book_dir.display(),
        config
            .book_type
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| "unknown side".to_string()),
        config.level.map(|l| l.to_string()).unwrap_or_else(|| "?".into()),
        config
            .book_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".into()),
    ));
    formatter.info(&format!("  Units: {}", config.total_units));
    formatter.info(&format!("  Output: {}", config.output_dir.display()));
    for (index, category) in config.merge_order.iter().enumerate() {
        formatter.list_item(
            index + 1,
            &format!(
                "{} ({} of {} units)",
                category.name,
                category.layout.unit_capacity().min(config.total_units),
                config.total_units,
            ),
        );
    }
    for review in &config.review_inserts {
        formatter.info(&format!(
            "  Review {} after unit {}",
            review.document.display_name(),
            review.end_unit,
        ));
    }
}

//! CLI argument parsing.
//!
//! Defines the command-line interface with `clap`. The binary takes one book
//! directory and turns it into per-unit PDFs; everything the planner can
//! detect on its own (book side, level, book number, unit count) is also
//! overridable here.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::BookType;
use crate::error::{AssembleError, Result};
use crate::output::OutputFormatter;
use crate::pipeline::PlanOptions;

/// Book side, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BookTypeArg {
    /// Listening (LC) side.
    Listening,
    /// Reading (RC) side.
    Reading,
}

impl From<BookTypeArg> for BookType {
    fn from(arg: BookTypeArg) -> Self {
        match arg {
            BookTypeArg::Listening => BookType::Listening,
            BookTypeArg::Reading => BookType::Reading,
        }
    }
}

/// Assemble per-unit study PDFs from a book directory.
///
/// unitbind classifies the PDFs in a book directory, works out where each
/// unit starts and ends, and merges one output file per unit, plus an
/// optional combined book and a merge report.
#[derive(Parser, Debug)]
#[command(name = "unitbind")]
#[command(version)]
#[command(about = "Assemble per-unit study PDFs from a book directory", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Book directory holding the source PDFs
    ///
    /// Scanned recursively; the output directory inside it is excluded.
    #[arg(required = true, value_name = "BOOK_DIR")]
    pub book_dir: PathBuf,

    /// Output directory for the merged files
    ///
    /// Defaults to BOOK_DIR/merged. Created when missing.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Also write a combined AllUnits.pdf after the unit files
    #[arg(short, long)]
    pub combine: bool,

    /// Number of units in the book
    ///
    /// Overrides detection, and enables the even-split fallback for
    /// monolithic files without recognizable unit markers.
    #[arg(short, long, value_name = "N")]
    pub units: Option<usize>,

    /// Book side (listening or reading)
    ///
    /// Overrides detection from directory names, file names and content.
    #[arg(long, value_name = "SIDE", value_enum)]
    pub book_type: Option<BookTypeArg>,

    /// Level of the book
    #[arg(long, value_name = "N")]
    pub level: Option<u32>,

    /// Book number, which decides the required material categories
    #[arg(long, value_name = "N")]
    pub book_number: Option<u32>,

    /// Discard unit boundaries found before this page (0-based)
    ///
    /// Resolves books whose front matter repeats "Unit 1": boundaries on
    /// earlier pages are dropped and the scan restarts here.
    #[arg(long, value_name = "PAGE")]
    pub restart_at: Option<usize>,

    /// Continue even when required categories are missing
    ///
    /// Missing categories are reported as warnings and their pages are
    /// simply absent from the output.
    #[arg(long)]
    pub allow_missing: bool,

    /// Load the merge plan from a JSON file instead of building one
    ///
    /// Command-line overrides still apply on top of the loaded plan.
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Write the built merge plan to a JSON file and stop
    ///
    /// The plan is validated but nothing is merged; feed the file back with
    /// --plan (after editing, if needed) to run it.
    #[arg(long, value_name = "FILE")]
    pub emit_plan: Option<PathBuf>,

    /// Validate and show the plan without writing any PDFs
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Overwrite existing output files
    #[arg(short, long)]
    pub force: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Validate arguments before any file I/O.
    ///
    /// # Errors
    ///
    /// Returns an error on values clap cannot reject on its own, such as a
    /// zero unit count.
    pub fn validate(&self) -> Result<()> {
        if self.units == Some(0) {
            return Err(AssembleError::invalid_plan("unit count must be at least 1"));
        }
        if let Some(plan) = &self.plan {
            if !plan.exists() {
                return Err(AssembleError::invalid_plan(format!(
                    "plan file not found: {}",
                    plan.display()
                )));
            }
        }
        Ok(())
    }

    /// Planner options from the arguments.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            output_dir: self.output.clone(),
            book_type: self.book_type.map(BookType::from),
            level: self.level,
            book_number: self.book_number,
            total_units: self.units,
            restart_at: self.restart_at,
            allow_missing: self.allow_missing,
        }
    }

    /// Formatter matching the requested verbosity.
    pub fn formatter(&self) -> OutputFormatter {
        OutputFormatter::new(self.quiet, self.verbose)
    }
}

//! Error types for unit assembly operations.
//!
//! A single crate-wide error enum covers discovery, planning, validation,
//! merging and writing. Variants carry enough payload to print actionable
//! messages and to map onto process exit codes.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AssembleError>;

/// Errors produced while planning or assembling a book.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// A referenced file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// A PDF could not be parsed.
    #[error("Failed to load PDF {path}: {reason}")]
    FailedToLoadPdf {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Underlying parser message.
        reason: String,
    },

    /// The file loaded but its structure is unusable.
    #[error("Corrupted PDF {path}: {details}")]
    CorruptedPdf {
        /// Path to the corrupted file.
        path: PathBuf,
        /// What was wrong with it.
        details: String,
    },

    /// Password-protected input.
    #[error("PDF is encrypted and cannot be processed: {path}")]
    EncryptedPdf {
        /// Path to the encrypted file.
        path: PathBuf,
    },

    /// A book directory contained no PDF files at all.
    #[error("No PDF files found under {dir}")]
    NoPdfFiles {
        /// Directory that was scanned.
        dir: PathBuf,
    },

    /// Required categories for the detected level are absent.
    #[error("Missing required categories: {}", names.join(", "))]
    MissingCategories {
        /// Canonical names of the missing categories.
        names: Vec<String>,
    },

    /// The merge plan failed validation.
    #[error("Invalid plan: {message}")]
    InvalidPlan {
        /// Human-readable description of the problem.
        message: String,
    },

    /// An output file already exists and overwrite was not requested.
    #[error("Output already exists: {path} (use --force to overwrite)")]
    OutputExists {
        /// Existing output path.
        path: PathBuf,
    },

    /// The output directory or file could not be created.
    #[error("Failed to create output {path}: {reason}")]
    FailedToCreateOutput {
        /// Path that could not be created.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Writing a finished document failed.
    #[error("Failed to write {path}: {reason}")]
    FailedToWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The merge run itself failed.
    #[error("Merge failed: {reason}")]
    MergeFailed {
        /// What went wrong.
        reason: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error surfaced by the PDF engine.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssembleError {
    /// Convenience constructor for load failures.
    pub fn load_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for plan problems.
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan {
            message: message.into(),
        }
    }

    /// Convenience constructor for merge failures.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Whether the condition is tied to a single input and a batch run may
    /// continue past it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FailedToLoadPdf { .. }
                | Self::CorruptedPdf { .. }
                | Self::EncryptedPdf { .. }
                | Self::FileNotFound { .. }
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPlan { .. }
            | Self::MissingCategories { .. }
            | Self::NoPdfFiles { .. } => 2,
            Self::FileNotFound { .. }
            | Self::FailedToLoadPdf { .. }
            | Self::CorruptedPdf { .. }
            | Self::EncryptedPdf { .. } => 3,
            Self::OutputExists { .. }
            | Self::FailedToCreateOutput { .. }
            | Self::FailedToWrite { .. } => 4,
            Self::MergeFailed { .. } => 5,
            Self::Io(_) | Self::Pdf(_) | Self::Other(_) => 1,
        }
    }
}

//! Content and filename detection.
//!
//! Everything in this module is pure: detectors take strings (filenames,
//! extracted page text) and return structured results. File reading lives in
//! [`crate::io`]; decisions that need user input are surfaced as signals and
//! resolved by the caller through options.

pub mod book_meta;
pub mod boundary;
pub mod classify;
pub mod filter;
pub mod text;

pub use book_meta::BookMetadataDetector;
pub use boundary::{BoundaryOptions, BoundaryScan, UnitBoundaryDetector};
pub use classify::{Classification, ClassifiedFile, ClassifiedSet, FileClassifier};
pub use filter::{FilterOutcome, LevelFileFilter};

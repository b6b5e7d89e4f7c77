//! Unit assembly.

pub mod engine;
pub mod pages;

pub use engine::{MergeRunResult, MergeStatistics, UnitMergeEngine, UnitOutcome};
pub use pages::{DocumentAssembler, PageSlice};

//! Level-based category requirements.
//!
//! Which material a finished unit must contain depends on the book side and,
//! on the Reading side, on a step function of the book number. A Listening
//! book carries word material only: the filter keeps Word List and Word Test
//! and nothing else, with no requirement gate. For Reading (and unknown side)
//! the filter checks a classified directory against the book-number
//! requirement set and either hands back the selection or signals exactly
//! which requirements are unmet; proceeding anyway is the caller's call.

use crate::config::BookType;
use crate::detect::classify::{ClassifiedEntry, ClassifiedSet};
use std::collections::BTreeMap;

/// Categories a Listening book keeps, in merge order.
const LISTENING_CATEGORIES: &[&str] = &["Word List", "Word Test"];

/// Requirement set for one book-number band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSet {
    /// Categories that must all be present.
    pub required: Vec<&'static str>,
    /// Groups where at least one member must be present.
    pub any_of: Vec<Vec<&'static str>>,
}

impl RequiredSet {
    /// Every category name this set can select, requirement groups included.
    pub fn selectable(&self) -> Vec<&'static str> {
        let mut names = self.required.clone();
        for group in &self.any_of {
            names.extend(group.iter().copied());
        }
        names
    }
}

/// Requirement set for a book number.
///
/// Unknown numbers get the mid-band set, the most common shape.
pub fn required_for(book_number: Option<u32>) -> RequiredSet {
    match book_number {
        Some(n) if n <= 60 => RequiredSet {
            required: vec![
                "Word List",
                "Translation Sheet",
                "Unscramble Sheet",
                "Unit Test",
            ],
            any_of: vec![vec!["Word Writing", "Word Test"]],
        },
        Some(n) if n >= 100 => RequiredSet {
            required: vec![
                "Word List",
                "Word Test",
                "Translation Sheet",
                "Unscramble Sheet",
                "Unit Test",
                "Grammar Sheet",
            ],
            any_of: vec![],
        },
        Some(n) if n >= 80 => RequiredSet {
            required: vec![
                "Word List",
                "Word Test",
                "Translation Sheet",
                "Unscramble Sheet",
                "Unit Test",
            ],
            any_of: vec![],
        },
        _ => RequiredSet {
            required: vec![
                "Word List",
                "Word Test",
                "Translation Sheet",
                "Unscramble Sheet",
            ],
            any_of: vec![],
        },
    }
}

/// Categories selected for merging, in requirement-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedCategories {
    /// Category name to its files, ordered as the requirement set lists them.
    pub categories: Vec<(String, Vec<ClassifiedEntry>)>,
}

impl SelectedCategories {
    /// Names of the selected categories.
    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Result of requirement filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Every requirement was met.
    Complete(SelectedCategories),
    /// Something required is absent; the partial selection is still usable
    /// when the caller chooses to continue.
    MissingRequired {
        /// Names of unmet requirements. A missing one-of group is rendered
        /// as its members joined with " or ".
        missing: Vec<String>,
        /// What was found anyway.
        partial: SelectedCategories,
    },
}

impl FilterOutcome {
    /// The selection, regardless of completeness.
    pub fn selection(&self) -> &SelectedCategories {
        match self {
            Self::Complete(s) => s,
            Self::MissingRequired { partial, .. } => partial,
        }
    }

    /// Whether all requirements were met.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Applies the book-number requirement sets to a classified directory.
#[derive(Debug, Default)]
pub struct LevelFileFilter;

impl LevelFileFilter {
    /// Create a filter.
    pub fn new() -> Self {
        Self
    }

    /// Select the categories to merge from `set`.
    ///
    /// A Listening book keeps word material only; a Reading (or undetected)
    /// book is held to the `book_number` requirement set. Answer keys were
    /// already excluded at classification time. For a one-of group the first
    /// present member (in group order) is selected.
    pub fn filter(
        &self,
        set: &ClassifiedSet,
        book_type: Option<BookType>,
        book_number: Option<u32>,
    ) -> FilterOutcome {
        if book_type == Some(BookType::Listening) {
            let mut selected = SelectedCategories::default();
            for name in LISTENING_CATEGORIES {
                if let Some(entries) = set.categories.get(*name) {
                    selected.categories.push((name.to_string(), entries.clone()));
                }
            }
            return FilterOutcome::Complete(selected);
        }

        let requirements = required_for(book_number);
        let present: BTreeMap<&str, &Vec<ClassifiedEntry>> = set
            .categories
            .iter()
            .map(|(name, entries)| (name.as_str(), entries))
            .collect();

        let mut selected = SelectedCategories::default();
        let mut missing = Vec::new();

        for name in &requirements.required {
            match present.get(name) {
                Some(entries) => selected
                    .categories
                    .push((name.to_string(), (*entries).clone())),
                None => missing.push(name.to_string()),
            }
        }

        for group in &requirements.any_of {
            match group.iter().find(|name| present.contains_key(*name)) {
                Some(name) => {
                    let entries = present[*name];
                    selected.categories.push((name.to_string(), entries.clone()));
                }
                None => missing.push(group.join(" or ")),
            }
        }

        if missing.is_empty() {
            FilterOutcome::Complete(selected)
        } else {
            FilterOutcome::MissingRequired {
                missing,
                partial: selected,
            }
        }
    }
}

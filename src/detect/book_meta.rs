//! Book metadata detection.
//!
//! A book directory belongs to one side of a two-sided course book
//! (Listening/LC or Reading/RC) and carries a level and a book number that
//! drive which material categories are required. Detection walks a fixed
//! ladder of cheap strategies and stops at the first hit; content scanning
//! (the expensive last resort) is driven by the pipeline, which feeds
//! extracted text back through [`BookMetadataDetector::side_from_text`].

use crate::config::BookType;
use crate::detect::text::normalize_file_name;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LISTENING_MARKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\blc\b|\bl\.c\b|left\s*cover|왼쪽|좌측").expect("valid listening pattern")
});

static READING_MARKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\brc\b|\br\.c\b|right\s*cover|오른쪽|우측").expect("valid reading pattern")
});

static LEVEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"level[\s_]*(\d+)",
        r"_l(\d+)_",
        r"[_\s]l(\d+)[_\s]",
        r"\bl(\d+)\b",
        r"레벨\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid level pattern"))
    .collect()
});

static BOOK_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"reading\s+(\d+)",
        r"listening\s+(\d+)",
        r"(?:^|[_\s])(\d{1,3})(?:[_\s]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid book number pattern"))
    .collect()
});

/// How many filenames the name-based side detection inspects.
const NAME_SCAN_LIMIT: usize = 10;

/// Detects book side, level and book number from names and text.
#[derive(Debug, Default)]
pub struct BookMetadataDetector;

impl BookMetadataDetector {
    /// Create a detector.
    pub fn new() -> Self {
        Self
    }

    /// Determine the book side from one piece of text.
    ///
    /// Explicit side words win over the LC/RC mark patterns.
    pub fn side_from_text(&self, text: &str) -> Option<BookType> {
        let normalized = normalize_file_name(text);
        if normalized.contains("listening") {
            return Some(BookType::Listening);
        }
        if normalized.contains("reading") {
            return Some(BookType::Reading);
        }
        if LISTENING_MARKS.is_match(&normalized) {
            return Some(BookType::Listening);
        }
        if READING_MARKS.is_match(&normalized) {
            return Some(BookType::Reading);
        }
        None
    }

    /// Determine the book side from directory and file names.
    ///
    /// Ladder: book directory name, parent directory names of the PDFs, then
    /// the first [`NAME_SCAN_LIMIT`] file stems.
    pub fn side_from_names(&self, book_dir: &Path, pdf_paths: &[PathBuf]) -> Option<BookType> {
        if let Some(name) = book_dir.file_name() {
            if let Some(side) = self.side_from_text(&name.to_string_lossy()) {
                return Some(side);
            }
        }

        let mut subdirs: Vec<String> = pdf_paths
            .iter()
            .filter_map(|p| p.parent())
            .filter(|parent| *parent != book_dir)
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        subdirs.sort();
        subdirs.dedup();
        for dir in &subdirs {
            if let Some(side) = self.side_from_text(dir) {
                return Some(side);
            }
        }

        pdf_paths
            .iter()
            .take(NAME_SCAN_LIMIT)
            .filter_map(|p| p.file_stem())
            .find_map(|stem| self.side_from_text(&stem.to_string_lossy()))
    }

    /// Infer the book side from which categories exist.
    ///
    /// Translation and unscramble material only appears on the reading side;
    /// a directory holding nothing beyond word lists and word tests is the
    /// listening side.
    pub fn side_from_structure(&self, category_names: &[&str]) -> Option<BookType> {
        let has = |name: &str| category_names.iter().any(|c| *c == name);
        if has("Translation Sheet") || has("Unscramble Sheet") {
            return Some(BookType::Reading);
        }
        if has("Word List") || has("Word Test") || has("Word Writing") {
            return Some(BookType::Listening);
        }
        None
    }

    /// Detect the level from the directory name, then the file stems.
    pub fn detect_level(&self, book_dir: &Path, pdf_paths: &[PathBuf]) -> Option<u32> {
        if let Some(name) = book_dir.file_name() {
            if let Some(level) = level_from_name(&name.to_string_lossy()) {
                return Some(level);
            }
        }
        pdf_paths
            .iter()
            .take(NAME_SCAN_LIMIT)
            .filter_map(|p| p.file_stem())
            .find_map(|stem| level_from_name(&stem.to_string_lossy()))
    }

    /// Detect the book number from the directory name.
    pub fn detect_book_number(&self, book_dir: &Path) -> Option<u32> {
        let name = book_dir.file_name()?.to_string_lossy().to_lowercase();
        let spaced = name.replace(['_', '-'], " ");
        BOOK_NUMBER_PATTERNS
            .iter()
            .find_map(|re| re.captures(&spaced).and_then(|c| c[1].parse().ok()))
    }
}

fn level_from_name(name: &str) -> Option<u32> {
    let lowered = name.to_lowercase();
    LEVEL_PATTERNS
        .iter()
        .find_map(|re| re.captures(&lowered).and_then(|c| c[1].parse().ok()))
}

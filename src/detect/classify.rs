//! Filename classification.
//!
//! Source PDFs are classified into canonical material categories from their
//! names alone. Review tests and answer keys are routed out before category
//! matching: reviews become inserts with an optional unit range, answer keys
//! are excluded from merging entirely.

use crate::detect::text::normalize_file_name;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Canonical category names, in match precedence order. "Unit Test" comes
/// first so the bare word "test" cannot misroute it.
const CATEGORY_PATTERNS: &[(&str, &str)] = &[
    ("Unit Test", r"unit\s*test"),
    ("Word List", r"word\s*list"),
    ("Word Writing", r"word\s*writing"),
    ("Word Test", r"word\s*test"),
    ("Translation Sheet", r"translation"),
    ("Unscramble Sheet", r"unscramble"),
    ("Grammar Sheet", r"grammar"),
];

static ANSWER_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"answer|답지|정답").expect("valid answer-key pattern"));

static REVIEW_TEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"review\s*test|리뷰\s*테스트").expect("valid review pattern"));

static REVIEW_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"units?[\s_]*(\d{1,2})[\s\-~]+(\d{1,2})").expect("valid review range pattern")
});

// Tried in order; the first match wins.
static UNIT_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"unit[ _-]?(\d{1,2})",
        r"\bu[ _-]?(\d{1,2})\b",
        r"_u(\d{1,2})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid unit number pattern"))
    .collect()
});

static TEST_VARIANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"test\s+([a-d])\b").expect("valid variant pattern"));

static TRAILING_VARIANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([a-d])$").expect("valid trailing variant pattern"));

static UNIT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bunit\s*\d{1,2}\b|\bu\s*\d{1,2}\b|\b\d{1,2}\b").expect("valid unit token pattern")
});

static CATEGORY_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    CATEGORY_PATTERNS
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(pattern).expect("valid category pattern")))
        .collect()
});

/// What one filename was recognized as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A merge category member.
    Category {
        /// Canonical (or stem-derived) category name.
        name: String,
        /// Unit number parsed from the name, if any.
        unit: Option<u32>,
        /// A/B variant letter for paired tests, if any.
        variant: Option<char>,
    },
    /// A review test inserted after a unit.
    ReviewTest {
        /// First unit covered, when the name carries a range.
        start_unit: Option<u32>,
        /// Last unit covered, when the name carries a range.
        end_unit: Option<u32>,
    },
    /// An answer key, never merged.
    AnswerKey,
}

/// One classified file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    /// Path of the source PDF.
    pub path: PathBuf,
    /// Its classification.
    pub classification: Classification,
}

/// Category member after grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEntry {
    /// Path of the source PDF.
    pub path: PathBuf,
    /// Unit number from the filename.
    pub unit: Option<u32>,
    /// Paired-test variant letter.
    pub variant: Option<char>,
}

/// Review file after grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFile {
    /// Path of the review PDF.
    pub path: PathBuf,
    /// First unit covered, if named.
    pub start_unit: Option<u32>,
    /// Last unit covered, if named.
    pub end_unit: Option<u32>,
}

/// Grouped classification of a whole book directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedSet {
    /// Category name to members, members sorted ascending by unit number
    /// (unknown numbers sort first).
    pub categories: BTreeMap<String, Vec<ClassifiedEntry>>,
    /// Review tests found in the directory.
    pub reviews: Vec<ReviewFile>,
    /// Files excluded from merging (answer keys).
    pub excluded: Vec<PathBuf>,
}

impl ClassifiedSet {
    /// Canonical names of the categories present.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }
}

/// Classifies PDFs by filename.
#[derive(Debug, Default)]
pub struct FileClassifier;

impl FileClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a single file by its name.
    pub fn classify(&self, path: &Path) -> ClassifiedFile {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let normalized = normalize_file_name(&stem);

        if ANSWER_KEY.is_match(&normalized) {
            return ClassifiedFile {
                path: path.to_path_buf(),
                classification: Classification::AnswerKey,
            };
        }

        if REVIEW_TEST.is_match(&normalized) {
            let (start_unit, end_unit) = REVIEW_RANGE
                .captures(&normalized)
                .map(|c| (c[1].parse().ok(), c[2].parse().ok()))
                .unwrap_or((None, None));
            return ClassifiedFile {
                path: path.to_path_buf(),
                classification: Classification::ReviewTest {
                    start_unit,
                    end_unit,
                },
            };
        }

        let name = CATEGORY_MATCHERS
            .iter()
            .find(|(_, re)| re.is_match(&normalized))
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| stem_category(&normalized));

        let unit = extract_unit_number(&normalized);
        let variant = if name == "Word Test" {
            extract_variant(&normalized)
        } else {
            None
        };

        ClassifiedFile {
            path: path.to_path_buf(),
            classification: Classification::Category {
                name,
                unit,
                variant,
            },
        }
    }

    /// Classify and group a directory's worth of files.
    ///
    /// Within each category, files sort ascending by unit number with unknown
    /// numbers first. When a paired-test category carries both A and B
    /// variants, the B set is dropped.
    pub fn group(&self, paths: &[PathBuf]) -> ClassifiedSet {
        let mut set = ClassifiedSet::default();

        for path in paths {
            let classified = self.classify(path);
            match classified.classification {
                Classification::AnswerKey => set.excluded.push(classified.path),
                Classification::ReviewTest {
                    start_unit,
                    end_unit,
                } => set.reviews.push(ReviewFile {
                    path: classified.path,
                    start_unit,
                    end_unit,
                }),
                Classification::Category {
                    name,
                    unit,
                    variant,
                } => {
                    set.categories.entry(name).or_default().push(ClassifiedEntry {
                        path: classified.path,
                        unit,
                        variant,
                    });
                }
            }
        }

        for entries in set.categories.values_mut() {
            let has_a = entries.iter().any(|e| e.variant == Some('a'));
            let has_b = entries.iter().any(|e| e.variant == Some('b'));
            if has_a && has_b {
                entries.retain(|e| e.variant != Some('b'));
            }
            entries.sort_by_key(|e| (e.unit.unwrap_or(0), e.path.clone()));
        }

        set.reviews.sort_by_key(|r| (r.end_unit.unwrap_or(0), r.path.clone()));
        set
    }
}

/// Extract a unit number from a normalized filename.
pub fn extract_unit_number(normalized: &str) -> Option<u32> {
    UNIT_NUMBER_PATTERNS
        .iter()
        .find_map(|re| re.captures(normalized).and_then(|c| c[1].parse().ok()))
}

fn extract_variant(normalized: &str) -> Option<char> {
    TEST_VARIANT
        .captures(normalized)
        .or_else(|| TRAILING_VARIANT.captures(normalized))
        .and_then(|c| c[1].chars().next())
}

// Fall back to the stem itself, minus unit tokens, so unrecognized material
// still groups across its per-unit files.
fn stem_category(normalized: &str) -> String {
    let stripped = UNIT_TOKEN.replace_all(normalized, " ");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        "misc".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn classify(name: &str) -> Classification {
        FileClassifier::new()
            .classify(Path::new(name))
            .classification
    }

    #[rstest]
    #[case("Word_List_Unit_01.pdf", "Word List", Some(1))]
    #[case("word-test-u03.pdf", "Word Test", Some(3))]
    #[case("Translation_Sheet_Unit12.pdf", "Translation Sheet", Some(12))]
    #[case("Unscramble_Sheet_u2.pdf", "Unscramble Sheet", Some(2))]
    #[case("Unit_Test_Unit_05.pdf", "Unit Test", Some(5))]
    #[case("Grammar_Sheet_Unit_2.pdf", "Grammar Sheet", Some(2))]
    #[case("Word_Writing_Unit_4.pdf", "Word Writing", Some(4))]
    #[case("Unit_Test_ALL.pdf", "Unit Test", None)]
    fn test_category_and_unit(
        #[case] file: &str,
        #[case] expected_name: &str,
        #[case] expected_unit: Option<u32>,
    ) {
        match classify(file) {
            Classification::Category { name, unit, .. } => {
                assert_eq!(name, expected_name);
                assert_eq!(unit, expected_unit);
            }
            other => panic!("expected category for {file}, got {other:?}"),
        }
    }

    #[test]
    fn test_unit_test_not_word_test() {
        // "Unit Test" contains "test" but must not land in "Word Test".
        match classify("unit_test_u1.pdf") {
            Classification::Category { name, .. } => assert_eq!(name, "Unit Test"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_answer_keys_excluded() {
        assert_eq!(classify("word_test_answer.pdf"), Classification::AnswerKey);
        assert_eq!(classify("정답_unit1.pdf"), Classification::AnswerKey);
        assert_eq!(classify("답지.pdf"), Classification::AnswerKey);
    }

    #[test]
    fn test_review_test_with_range() {
        assert_eq!(
            classify("Review_Test_Units_1-2.pdf"),
            Classification::ReviewTest {
                start_unit: Some(1),
                end_unit: Some(2),
            }
        );
    }

    #[test]
    fn test_review_test_without_range() {
        assert_eq!(
            classify("리뷰 테스트.pdf"),
            Classification::ReviewTest {
                start_unit: None,
                end_unit: None,
            }
        );
    }

    #[test]
    fn test_word_test_variant_letter() {
        match classify("Word_Test_Unit_3_A.pdf") {
            Classification::Category { variant, unit, .. } => {
                assert_eq!(variant, Some('a'));
                assert_eq!(unit, Some(3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_name_groups_by_stem() {
        match classify("Speaking_Drill_u1.pdf") {
            Classification::Category { name, unit, .. } => {
                assert_eq!(name, "speaking drill");
                assert_eq!(unit, Some(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_group_sorts_by_unit_with_unknown_first() {
        let paths = vec![
            PathBuf::from("Word_List_Unit_02.pdf"),
            PathBuf::from("Word_List.pdf"),
            PathBuf::from("Word_List_Unit_01.pdf"),
        ];
        let set = FileClassifier::new().group(&paths);
        let entries = &set.categories["Word List"];
        assert_eq!(entries[0].unit, None);
        assert_eq!(entries[1].unit, Some(1));
        assert_eq!(entries[2].unit, Some(2));
    }

    #[test]
    fn test_group_prefers_a_variant() {
        let paths = vec![
            PathBuf::from("Word_Test_Unit_1_A.pdf"),
            PathBuf::from("Word_Test_Unit_1_B.pdf"),
            PathBuf::from("Word_Test_Unit_2_A.pdf"),
            PathBuf::from("Word_Test_Unit_2_B.pdf"),
        ];
        let set = FileClassifier::new().group(&paths);
        let entries = &set.categories["Word Test"];
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.variant == Some('a')));
    }

    #[test]
    fn test_group_keeps_lone_b_variant() {
        let paths = vec![
            PathBuf::from("Word_Test_Unit_1_B.pdf"),
            PathBuf::from("Word_Test_Unit_2_B.pdf"),
        ];
        let set = FileClassifier::new().group(&paths);
        assert_eq!(set.categories["Word Test"].len(), 2);
    }

    #[test]
    fn test_group_routes_reviews_and_answers() {
        let paths = vec![
            PathBuf::from("Word_List_Unit_01.pdf"),
            PathBuf::from("Review_Test_Units_1-2.pdf"),
            PathBuf::from("word_list_answer.pdf"),
        ];
        let set = FileClassifier::new().group(&paths);
        assert_eq!(set.categories.len(), 1);
        assert_eq!(set.reviews.len(), 1);
        assert_eq!(set.reviews[0].end_unit, Some(2));
        assert_eq!(set.excluded.len(), 1);
    }
}

//! Unit boundary detection from extracted page text.
//!
//! A monolithic study PDF packs several units back to back. The detector
//! scans per-page text for unit markers ("Unit 3", "UNIT.3", "unit: 12") and
//! turns them into per-unit page lengths. Table-of-contents pages are
//! excluded so a TOC listing every unit does not open a boundary.
//!
//! The scan is pure and total: ambiguities (a repeated "Unit 1", an unordered
//! number sequence, no markers at all) are reported in the result rather than
//! resolved here, and the caller re-runs the scan with [`BoundaryOptions`]
//! overrides when needed.

use crate::detect::text::normalize_page_text;
use regex::Regex;
use std::sync::LazyLock;

// Normalization already rejoined "unit" and lowercased, so the marker only
// needs to tolerate the separator and digit spacing.
static UNIT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"unit\s*[.:∙-]?\s*(\d{1,2})").expect("valid unit marker pattern"));

const TOC_KEYWORDS: &[&str] = &["목차", "table of contents", "contents", "index"];

/// Minimum distinct unit numbers on one page for it to count as a TOC.
const TOC_DISTINCT_UNITS: usize = 3;

/// Caller-supplied overrides for a boundary scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryOptions {
    /// Discard boundaries before this page index. Used to resolve a repeated
    /// "Unit 1" where the real book starts after front matter.
    pub restart_at: Option<usize>,
    /// Unit count for the even-split fallback when no markers are found.
    pub fallback_units: Option<usize>,
}

/// Result of scanning one document's pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryScan {
    /// Page length of each detected unit, in unit order.
    pub unit_lengths: Vec<usize>,
    /// Unit number at each boundary, parallel to `unit_lengths`.
    pub unit_numbers: Vec<u32>,
    /// Page index of each boundary, parallel to `unit_lengths`.
    pub boundary_pages: Vec<usize>,
    /// Pages classified as table-of-contents and skipped.
    pub toc_pages: Vec<usize>,
    /// Page indices where unit number 1 opened a boundary. More than one
    /// entry means the scan is ambiguous and may need `restart_at`.
    pub restart_candidates: Vec<usize>,
    /// Whether the boundary numbers form exactly `1..=k`.
    pub ordered: bool,
    /// Whether the even-split fallback produced the lengths.
    pub used_fallback: bool,
}

impl BoundaryScan {
    /// True when no units were found and no fallback applied.
    pub fn is_empty(&self) -> bool {
        self.unit_lengths.is_empty()
    }

    /// Number of units detected.
    pub fn unit_count(&self) -> usize {
        self.unit_lengths.len()
    }
}

/// Detects unit boundaries in extracted page text.
#[derive(Debug, Default)]
pub struct UnitBoundaryDetector;

impl UnitBoundaryDetector {
    /// Create a detector.
    pub fn new() -> Self {
        Self
    }

    /// Scan a document's pages for unit boundaries.
    ///
    /// `pages` holds the extracted text of every page in order; pages with no
    /// extractable text participate in length accounting but never open a
    /// boundary.
    pub fn scan(&self, pages: &[String], options: &BoundaryOptions) -> BoundaryScan {
        let total = pages.len();
        let normalized: Vec<String> = pages.iter().map(|p| normalize_page_text(p)).collect();

        let mut toc_pages = Vec::new();
        let mut boundaries: Vec<(usize, u32)> = Vec::new();
        // First page the scan covers: 0, pushed forward past leading TOC pages.
        let mut scan_start = 0usize;

        for (i, text) in normalized.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            if self.is_toc_page(text) {
                toc_pages.push(i);
                if boundaries.is_empty() && i == scan_start {
                    scan_start = i + 1;
                }
                continue;
            }

            let Some(number) = first_unit_number(text) else {
                continue;
            };

            if boundaries.is_empty() {
                // A marker on the page right after the scan start absorbs
                // that page (usually a cover, possibly textless) into the
                // first unit.
                let at = if i == scan_start + 1 { scan_start } else { i };
                boundaries.push((at, number));
            } else if boundaries[boundaries.len() - 1].1 != number {
                boundaries.push((i, number));
            }
        }

        let restart_candidates: Vec<usize> = boundaries
            .iter()
            .filter(|(_, n)| *n == 1)
            .map(|(page, _)| *page)
            .collect();

        if let Some(restart) = options.restart_at {
            boundaries.retain(|(page, _)| *page >= restart);
        }

        if boundaries.is_empty() {
            return self.fallback_scan(total, toc_pages, restart_candidates, options);
        }

        let mut unit_lengths = Vec::with_capacity(boundaries.len());
        for (j, (page, _)) in boundaries.iter().enumerate() {
            let end = boundaries
                .get(j + 1)
                .map(|(next, _)| *next)
                .unwrap_or(total);
            unit_lengths.push(end - page);
        }

        let unit_numbers: Vec<u32> = boundaries.iter().map(|(_, n)| *n).collect();
        let boundary_pages: Vec<usize> = boundaries.iter().map(|(page, _)| *page).collect();
        let ordered = unit_numbers
            .iter()
            .enumerate()
            .all(|(j, n)| *n as usize == j + 1);

        BoundaryScan {
            unit_lengths,
            unit_numbers,
            boundary_pages,
            toc_pages,
            restart_candidates,
            ordered,
            used_fallback: false,
        }
    }

    fn fallback_scan(
        &self,
        total: usize,
        toc_pages: Vec<usize>,
        restart_candidates: Vec<usize>,
        options: &BoundaryOptions,
    ) -> BoundaryScan {
        let mut scan = BoundaryScan {
            toc_pages,
            restart_candidates,
            ordered: true,
            ..Default::default()
        };

        let Some(units) = options.fallback_units.filter(|n| *n > 0 && total > 0) else {
            return scan;
        };

        // Even split, remainder rides on the last unit.
        let base = total / units;
        let mut lengths = vec![base; units];
        if let Some(last) = lengths.last_mut() {
            *last += total % units;
        }

        scan.boundary_pages = lengths
            .iter()
            .scan(0usize, |page, len| {
                let at = *page;
                *page += len;
                Some(at)
            })
            .collect();
        scan.unit_lengths = lengths;
        scan.unit_numbers = (1..=units as u32).collect();
        scan.used_fallback = true;
        scan
    }

    /// Whether normalized page text reads as a table of contents.
    ///
    /// Either a TOC keyword or at least three distinct unit numbers on the
    /// same page. Two numbers alone is a legitimate content page (e.g. a
    /// review spanning two units).
    pub fn is_toc_page(&self, normalized_text: &str) -> bool {
        if TOC_KEYWORDS.iter().any(|k| normalized_text.contains(k)) {
            return true;
        }
        let mut distinct: Vec<u32> = UNIT_MARKER
            .captures_iter(normalized_text)
            .filter_map(|c| c[1].parse().ok())
            .collect();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len() >= TOC_DISTINCT_UNITS
    }
}

fn first_unit_number(normalized_text: &str) -> Option<u32> {
    UNIT_MARKER
        .captures(normalized_text)
        .and_then(|c| c[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    fn scan(texts: &[&str]) -> BoundaryScan {
        UnitBoundaryDetector::new().scan(&pages(texts), &BoundaryOptions::default())
    }

    #[test]
    fn test_two_units() {
        let result = scan(&["Unit 1 Vocabulary", "apple banana", "Unit 2 Vocabulary", "cat dog"]);
        assert_eq!(result.unit_lengths, vec![2, 2]);
        assert_eq!(result.unit_numbers, vec![1, 2]);
        assert!(result.ordered);
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_marker_spacing_and_separator_variants() {
        let result = scan(&["U nit. 1", "body", "UNIT:2", "body", "unit∙3", "body"]);
        assert_eq!(result.unit_numbers, vec![1, 2, 3]);
        assert_eq!(result.unit_lengths, vec![2, 2, 2]);
    }

    #[test]
    fn test_cover_page_absorbed_into_first_unit() {
        // Marker appears on the second scanned page; the cover joins unit 1.
        let result = scan(&["Springboard Reading 45", "Unit 1", "body", "Unit 2"]);
        assert_eq!(result.boundary_pages, vec![0, 3]);
        assert_eq!(result.unit_lengths, vec![3, 1]);
    }

    #[test]
    fn test_textless_cover_page_absorbed_into_first_unit() {
        // A scanned cover extracts no text; it still joins unit 1 when the
        // first marker sits on the page after it.
        let result = scan(&["", "Unit 1", "body", "Unit 2"]);
        assert_eq!(result.boundary_pages, vec![0, 3]);
        assert_eq!(result.unit_lengths, vec![3, 1]);
    }

    #[test]
    fn test_cover_after_leading_toc_absorbed() {
        // The scan restarts after a leading TOC page; absorption anchors
        // there, not at page 0.
        let result = scan(&[
            "Unit 1 ... 3 Unit 2 ... 9 Unit 3 ... 15",
            "cover",
            "Unit 1",
            "body",
            "Unit 2",
        ]);
        assert_eq!(result.toc_pages, vec![0]);
        assert_eq!(result.boundary_pages, vec![1, 4]);
        assert_eq!(result.unit_lengths, vec![3, 1]);
    }

    #[test]
    fn test_no_absorption_when_marker_is_further_in() {
        // Pages before the first boundary belong to no unit.
        let result = scan(&["cover", "credits", "Unit 1", "body", "Unit 2"]);
        assert_eq!(result.boundary_pages, vec![2, 4]);
        assert_eq!(result.unit_lengths, vec![2, 1]);
    }

    #[test]
    fn test_repeated_number_is_not_a_boundary() {
        let result = scan(&["Unit 1", "Unit 1 continued", "Unit 2"]);
        assert_eq!(result.unit_lengths, vec![2, 1]);
    }

    #[test]
    fn test_toc_page_by_distinct_count() {
        let result = scan(&[
            "Unit 1 ... 3 Unit 2 ... 9 Unit 3 ... 15",
            "Unit 1",
            "body",
            "Unit 2",
        ]);
        assert_eq!(result.toc_pages, vec![0]);
        assert_eq!(result.boundary_pages, vec![1, 3]);
        assert_eq!(result.unit_lengths, vec![2, 1]);
    }

    #[test]
    fn test_two_distinct_numbers_is_not_a_toc() {
        let detector = UnitBoundaryDetector::new();
        assert!(!detector.is_toc_page("unit 1 and unit 2 review"));
        assert!(detector.is_toc_page("unit 1 unit 2 unit 3"));
        assert!(detector.is_toc_page("목차"));
        assert!(detector.is_toc_page("table of contents"));
        assert!(detector.is_toc_page("index"));
    }

    #[test]
    fn test_restart_candidates_reported() {
        let texts: Vec<String> = (0..16)
            .map(|i| match i {
                0 => "Unit 1".to_string(),
                4 => "Unit 2".to_string(),
                12 => "Unit 1".to_string(),
                14 => "Unit 2".to_string(),
                _ => "body".to_string(),
            })
            .collect();
        let result = UnitBoundaryDetector::new().scan(&texts, &BoundaryOptions::default());
        assert_eq!(result.restart_candidates, vec![0, 12]);
        assert!(!result.ordered);
        assert_eq!(result.unit_numbers, vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_restart_override_discards_earlier_boundaries() {
        let texts: Vec<String> = (0..16)
            .map(|i| match i {
                0 => "Unit 1".to_string(),
                4 => "Unit 2".to_string(),
                12 => "Unit 1".to_string(),
                14 => "Unit 2".to_string(),
                _ => "body".to_string(),
            })
            .collect();
        let options = BoundaryOptions {
            restart_at: Some(12),
            ..Default::default()
        };
        let result = UnitBoundaryDetector::new().scan(&texts, &options);
        assert_eq!(result.boundary_pages, vec![12, 14]);
        assert_eq!(result.unit_lengths, vec![2, 2]);
        assert!(result.ordered);
    }

    #[test]
    fn test_fallback_even_split_remainder_to_last() {
        let texts: Vec<String> = (0..10).map(|_| "plain page".to_string()).collect();
        let options = BoundaryOptions {
            fallback_units: Some(4),
            ..Default::default()
        };
        let result = UnitBoundaryDetector::new().scan(&texts, &options);
        assert_eq!(result.unit_lengths, vec![2, 2, 2, 4]);
        assert_eq!(result.unit_numbers, vec![1, 2, 3, 4]);
        assert!(result.used_fallback);
    }

    #[test]
    fn test_no_markers_no_fallback_is_empty() {
        let result = scan(&["plain", "pages", "only"]);
        assert!(result.is_empty());
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_out_of_order_numbers_flagged() {
        let result = scan(&["Unit 1", "Unit 3", "Unit 4"]);
        assert_eq!(result.unit_numbers, vec![1, 3, 4]);
        assert!(!result.ordered);
    }

    #[test]
    fn test_empty_pages_skipped_but_counted() {
        let result = scan(&["Unit 1", "", "", "Unit 2"]);
        assert_eq!(result.unit_lengths, vec![3, 1]);
    }
}

//! Heuristic field extraction from a single free-text reference line.
//!
//! Citation styles have no fixed grammar, so every extractor here degrades to
//! `None` or an empty list instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::normalize_surname;

static DOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(10\.\d{4,9}/[^\s"<>]+)"#).unwrap());

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static DOI_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bdoi:").unwrap());

static INITIALS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{1,3}\b").unwrap());

static ET_AL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bet\.?\s*al\b").unwrap());

/// Segments shorter than this are never title candidates.
const MIN_TITLE_SEGMENT_CHARS: usize = 15;

/// Structured hints pulled out of one reference line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub doi: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub title_guess: Option<String>,
}

impl ExtractedFields {
    /// Run every extractor over `line`
    pub fn from_line(line: &str) -> Self {
        Self {
            doi: extract_doi(line),
            authors: extract_authors(line),
            year: extract_year(line),
            title_guess: extract_title_candidate(line),
        }
    }
}

/// First DOI in `text`, with trailing `).,;` trimmed
pub fn extract_doi(text: &str) -> Option<String> {
    let raw = DOI_RE.find(text)?.as_str();
    let doi = raw.trim_end_matches([')', '.', ',', ';']);
    if doi.is_empty() {
        None
    } else {
        Some(doi.to_string())
    }
}

/// First standalone 19xx/20xx year in `text`
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Heuristic: does this segment read like "Smith J, Doe A" rather than a title?
fn looks_like_author_list(segment: &str) -> bool {
    let commas = segment.matches(',').count();
    commas >= 2
        || ET_AL_RE.is_match(segment)
        || (commas >= 1 && INITIALS_RE.is_match(segment))
}

fn title_score(segment: &str) -> i64 {
    let words = segment.split_whitespace().count() as i64;
    let digits = segment.chars().filter(char::is_ascii_digit).count() as i64;
    words * 10 - digits
}

/// Best guess at the title substring of a reference line.
///
/// Splits on periods, drops a leading author-list segment, and picks the
/// highest-scoring remaining segment of at least 15 characters
/// (`words * 10 - digits`). Falls back to the second segment, then the first.
pub fn extract_title_candidate(line: &str) -> Option<String> {
    let parts: Vec<&str> = line
        .split('.')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let body = match parts.first() {
        Some(first) if looks_like_author_list(first) => &parts[1..],
        _ => &parts[..],
    };

    let mut best: Option<(&str, i64)> = None;
    for segment in body
        .iter()
        .copied()
        .filter(|s| s.chars().count() >= MIN_TITLE_SEGMENT_CHARS)
    {
        let score = title_score(segment);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((segment, score));
        }
    }

    best.map(|(segment, _)| segment)
        .or_else(|| parts.get(1).copied())
        .or_else(|| parts.first().copied())
        .map(str::to_string)
}

/// Ordered author surnames from the head of a reference line.
///
/// The head ends at the first period, the first year, or a `DOI:` label,
/// whichever comes first. Each comma-separated piece contributes its first
/// token once initials and any "et al" marker are removed.
pub fn extract_authors(line: &str) -> Vec<String> {
    let cut_points = [
        line.find('.'),
        YEAR_RE.find(line).map(|m| m.start()),
        DOI_LABEL_RE.find(line).map(|m| m.start()),
    ];
    let end = cut_points
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    let head = &line[..end];

    head.split(',')
        .filter_map(|piece| {
            let without_et_al = ET_AL_RE.replace_all(piece, " ");
            let without_initials = INITIALS_RE.replace_all(&without_et_al, " ");
            let cleaned = without_initials.replace('.', " ");
            cleaned
                .split_whitespace()
                .next()
                .map(normalize_surname)
                .filter(|s| !s.is_empty())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Smith J, Doe A. Effects of X on Y. J Med. 2020;10:1-9. DOI: 10.1000/xyz";

    #[test]
    fn test_extract_doi() {
        assert_eq!(extract_doi(SAMPLE), Some("10.1000/xyz".to_string()));
        assert_eq!(
            extract_doi("see (doi:10.1016/j.jpeds.2019.01.001)."),
            Some("10.1016/j.jpeds.2019.01.001".to_string())
        );
        assert_eq!(extract_doi("no identifier here"), None);
    }

    #[test]
    fn test_extract_doi_uses_first_match() {
        let text = "10.1000/first and 10.2000/second";
        assert_eq!(extract_doi(text), Some("10.1000/first".to_string()));
    }

    #[test]
    fn test_extract_doi_rejects_short_registrant() {
        assert_eq!(extract_doi("10.123/abc"), None);
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year(SAMPLE), Some(2020));
        assert_eq!(extract_year("Vol 12345 page 99"), None);
    }

    #[test]
    fn test_extract_authors_sample() {
        assert_eq!(extract_authors(SAMPLE), vec!["smith", "doe"]);
    }

    #[test]
    fn test_extract_authors_et_al_and_order() {
        let line = "Zhang Y, Adams RB, et al. Something long enough. Lancet. 2019.";
        assert_eq!(extract_authors(line), vec!["zhang", "adams"]);
    }

    #[test]
    fn test_extract_authors_keeps_duplicates() {
        let line = "Lee K, Lee J, Park S. Title words here. 2018.";
        assert_eq!(extract_authors(line), vec!["lee", "lee", "park"]);
    }

    #[test]
    fn test_extract_authors_stops_at_year() {
        let line = "Brown T, Green P 2017 Title without periods";
        assert_eq!(extract_authors(line), vec!["brown", "green"]);
    }

    #[test]
    fn test_extract_authors_keeps_surname_before_et_al() {
        assert_eq!(extract_authors("Smith J et al. Some title. 2019."), vec!["smith"]);
        assert_eq!(
            extract_authors("Smith J, Doe A et al. Some title. 2019."),
            vec!["smith", "doe"]
        );
        assert_eq!(
            extract_authors("Smith J, et al. Some title. 2019."),
            vec!["smith"]
        );
    }

    #[test]
    fn test_extract_authors_stops_at_doi_label() {
        let line = "Brown T, Green P DOI: 10.1000/x";
        assert_eq!(extract_authors(line), vec!["brown", "green"]);
    }

    #[test]
    fn test_extract_authors_empty_line() {
        assert!(extract_authors("").is_empty());
    }

    #[test]
    fn test_extract_title_candidate_skips_authors() {
        assert_eq!(
            extract_title_candidate(SAMPLE),
            Some("Effects of X on Y".to_string())
        );
    }

    #[test]
    fn test_extract_title_candidate_prefers_wordy_segment() {
        let line = "Kim S, Park J, Choi H. Caffeine therapy and outcomes in preterm infants. \
                    Journal of Perinatology 2021;41(3):100-110.";
        assert_eq!(
            extract_title_candidate(line),
            Some("Caffeine therapy and outcomes in preterm infants".to_string())
        );
    }

    #[test]
    fn test_extract_title_candidate_fallbacks() {
        assert_eq!(
            extract_title_candidate("Short. Bits. Only"),
            Some("Bits".to_string())
        );
        assert_eq!(extract_title_candidate("Single"), Some("Single".to_string()));
        assert_eq!(extract_title_candidate(""), None);
        assert_eq!(extract_title_candidate(" . . "), None);
    }

    #[test]
    fn test_extracted_fields_from_line() {
        let fields = ExtractedFields::from_line(SAMPLE);
        assert_eq!(fields.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(fields.authors, vec!["smith", "doe"]);
        assert_eq!(fields.year, Some(2020));
        assert_eq!(fields.title_guess.as_deref(), Some("Effects of X on Y"));
    }
}

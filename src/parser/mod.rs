//! Reference splitting and field extraction.
//!
//! A pasted block becomes one reference per non-empty line via
//! [`split_references`]; each line is then mined for a DOI, author surnames, a
//! year and a title guess (see [`ExtractedFields`]).

mod extract;

use once_cell::sync::Lazy;
use regex::Regex;

pub use extract::{
    extract_authors, extract_doi, extract_title_candidate, extract_year, ExtractedFields,
};

/// Lines that are copy-paste debris from publisher pages rather than references.
pub const BOILERPLATE_LABELS: &[&str] = &[
    "article",
    "pubmed",
    "pubmed central",
    "google scholar",
    "cas",
    "references",
    "crossref",
    "web of science",
];

static NUMBER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[\d+\]|\d+[.)])\s*").unwrap());

/// Split a pasted block into reference lines.
///
/// Blank lines and boilerplate labels are dropped; `[1]`, `1.` and `1)`
/// prefixes are stripped.
pub fn split_references(pasted: &str) -> Vec<String> {
    pasted
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let lowered = line.to_lowercase();
            !BOILERPLATE_LABELS.contains(&lowered.as_str())
        })
        .map(|line| NUMBER_PREFIX_RE.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_empty_input() {
        assert!(split_references("").is_empty());
        assert!(split_references("   \n\t\n  ").is_empty());
    }

    #[test]
    fn test_split_strips_prefixes() {
        let pasted = "[1] Smith J. First.\n2. Doe A. Second.\n3) Lee K. Third.";
        assert_eq!(
            split_references(pasted),
            vec!["Smith J. First.", "Doe A. Second.", "Lee K. Third."]
        );
    }

    #[test]
    fn test_split_drops_boilerplate_labels() {
        let pasted = "Smith J. First.\nPubMed\nGoogle Scholar\n\nCAS\nArticle\nDoe A. Second.";
        assert_eq!(split_references(pasted), vec!["Smith J. First.", "Doe A. Second."]);
    }

    #[test]
    fn test_split_keeps_year_leading_lines() {
        // "2020 ..." has no dot or paren after the number, so it is not a list prefix
        assert_eq!(
            split_references("2020 guidelines for neonatal care."),
            vec!["2020 guidelines for neonatal care."]
        );
    }

    #[test]
    fn test_split_preserves_order() {
        let refs = split_references("c\nb\na");
        assert_eq!(refs, vec!["c", "b", "a"]);
    }
}

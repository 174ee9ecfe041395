//! Title corroboration between a reference line and a candidate title.

use std::collections::HashSet;

use super::normalize;

/// Normalized candidate titles shorter than this never match.
pub const MIN_TITLE_CHARS: usize = 10;

/// Tokens this short or shorter are ignored when comparing word sets.
pub const MAX_IGNORED_TOKEN_CHARS: usize = 2;

/// A title needs at least this many tokens before one missing token may be rescued.
pub const RESCUE_MIN_TOKENS: usize = 8;

/// Length of the prefix/suffix compared when rescuing a missing token.
pub const RESCUE_AFFIX_CHARS: usize = 4;

/// Decide whether `candidate_title` plausibly names the work cited by `ref_line`.
///
/// Fails closed on empty, non-alphabetic, or very short titles. Passes when one
/// normalized text contains the other; otherwise every significant title token
/// must occur in the reference, except that a long title may miss one token if
/// some reference token shares its first or last four characters.
pub fn title_matches_strict(ref_line: &str, candidate_title: &str) -> bool {
    if candidate_title.trim().is_empty() || !candidate_title.chars().any(char::is_alphabetic) {
        return false;
    }

    let title = normalize(candidate_title);
    if title.chars().count() < MIN_TITLE_CHARS {
        return false;
    }

    let reference = normalize(ref_line);
    if reference.is_empty() {
        return false;
    }

    if reference.contains(&title) || title.contains(&reference) {
        return true;
    }

    let ref_tokens: HashSet<&str> = reference.split_whitespace().collect();
    let title_tokens: Vec<&str> = title
        .split_whitespace()
        .filter(|t| t.chars().count() > MAX_IGNORED_TOKEN_CHARS)
        .collect();

    let missing: Vec<&str> = title_tokens
        .iter()
        .copied()
        .filter(|t| !ref_tokens.contains(t))
        .collect();

    match missing.as_slice() {
        [] => true,
        [only] if title_tokens.len() >= RESCUE_MIN_TOKENS => {
            ref_tokens.iter().any(|candidate| shares_affix(only, candidate))
        }
        _ => false,
    }
}

fn prefix(token: &str) -> String {
    token.chars().take(RESCUE_AFFIX_CHARS).collect()
}

fn suffix(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let start = chars.len().saturating_sub(RESCUE_AFFIX_CHARS);
    chars[start..].iter().collect()
}

fn shares_affix(missing: &str, reference_token: &str) -> bool {
    prefix(missing) == prefix(reference_token) || suffix(missing) == suffix(reference_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "Smith J, Doe A. Effects of X on Y in preterm infants. J Med. 2020;10:1-9.";

    #[test]
    fn test_rejects_empty_and_short_titles() {
        assert!(!title_matches_strict(LINE, ""));
        assert!(!title_matches_strict(LINE, "   "));
        assert!(!title_matches_strict(LINE, "2020 10-9"));
        assert!(!title_matches_strict(LINE, "J Med"));
    }

    #[test]
    fn test_substring_match() {
        assert!(title_matches_strict(LINE, "Effects of X on Y in preterm infants"));
        assert!(title_matches_strict(LINE, "Effects of X on Y in Preterm Infants."));
    }

    #[test]
    fn test_containment_is_symmetric() {
        let short = "Effects of caffeine on apnea";
        let long = "Effects of caffeine on apnea of prematurity";
        assert!(title_matches_strict(short, long));
        assert!(title_matches_strict(long, short));
    }

    #[test]
    fn test_token_overlap_with_reordered_text() {
        let line = "Doe A. Neonatal outcomes, caffeine therapy and timing. Pediatrics 2019.";
        assert!(title_matches_strict(line, "Caffeine therapy timing and neonatal outcomes"));
    }

    #[test]
    fn test_british_spelling_in_reference() {
        let line = "Lee K. Randomised trial of caesarean technique. BJOG. 2018.";
        assert!(title_matches_strict(line, "Randomized trial of cesarean technique"));
    }

    #[test]
    fn test_one_missing_token_rescued_on_long_title() {
        let line = "Kim S. Association between early caffeine initiation and bronchopulmonary \
                    dysplasia in very low birthweight infantes. J Pediatr. 2021.";
        let title = "Association between early caffeine initiation and bronchopulmonary \
                     dysplasia in very low birthweight infants";
        assert!(title_matches_strict(line, title));
    }

    #[test]
    fn test_one_missing_token_not_rescued_on_short_title() {
        let line = "Kim S. Caffeine for apnoea in infantes. J Pediatr. 2021.";
        assert!(!title_matches_strict(line, "Caffeine for apnea in infants"));
    }

    #[test]
    fn test_two_missing_tokens_rejected() {
        let line = "Kim S. Association between early caffeine initiation and chronic lung \
                    disease in very low weight babies. J Pediatr. 2021.";
        let title = "Association between early caffeine initiation and bronchopulmonary \
                     dysplasia in very low birthweight infants";
        assert!(!title_matches_strict(line, title));
    }

    #[test]
    fn test_unrelated_title_rejected() {
        assert!(!title_matches_strict(LINE, "Deep learning for protein structure prediction"));
    }
}

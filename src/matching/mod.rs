//! Fuzzy matching of candidate records against reference lines.
//!
//! - [`normalize`]: canonical form used on both sides of every comparison
//! - [`title_matches_strict`]: title containment / token overlap with a narrow typo rescue
//! - [`authors_match`]: surname overlap
//! - [`year_matches`]: reference year against the set of years a record declares

mod authors;
mod normalize;
mod title;

use std::collections::BTreeSet;

pub use authors::authors_match;
pub use normalize::{
    normalize, normalize_surname, normalize_with, unescape_html, SpellingTable, SPELLING_VARIANTS,
};
pub use title::{title_matches_strict, MIN_TITLE_CHARS, RESCUE_MIN_TOKENS};

/// Years a reference may be off from a record in strict mode (print vs online-first).
pub const YEAR_TOLERANCE: u32 = 1;

/// Whether a reference year agrees with any year a record declares.
///
/// Missing data on either side never contradicts. Otherwise the year must be in
/// the set, or within `tolerance` of its closest member.
pub fn year_matches(year: Option<i32>, candidate_years: &BTreeSet<i32>, tolerance: u32) -> bool {
    let Some(year) = year else {
        return true;
    };
    if candidate_years.is_empty() || candidate_years.contains(&year) {
        return true;
    }
    candidate_years
        .iter()
        .map(|y| y.abs_diff(year))
        .min()
        .is_some_and(|distance| distance <= tolerance)
}

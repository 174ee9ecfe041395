//! Author surname overlap.

use super::normalize_surname;

/// Whether any input surname corresponds to any candidate surname.
///
/// Vacuously true when either side is empty. Surnames correspond when equal or
/// when one contains the other, which covers truncated compound and hyphenated
/// names ("garcia" vs "garcia-marquez").
pub fn authors_match<A, C>(input_authors: &[A], candidate_authors: &[C]) -> bool
where
    A: AsRef<str>,
    C: AsRef<str>,
{
    let input: Vec<String> = input_authors
        .iter()
        .map(|a| normalize_surname(a.as_ref()))
        .filter(|a| !a.is_empty())
        .collect();
    let candidates: Vec<String> = candidate_authors
        .iter()
        .map(|c| normalize_surname(c.as_ref()))
        .filter(|c| !c.is_empty())
        .collect();

    if input.is_empty() || candidates.is_empty() {
        return true;
    }

    input.iter().any(|a| {
        candidates
            .iter()
            .any(|c| a == c || a.contains(c.as_str()) || c.contains(a.as_str()))
    })
}

//! Text canonicalization for fuzzy comparison.
//!
//! The same [`normalize`] runs on reference lines and on candidate titles so
//! every comparison in the matcher is symmetric.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// British spellings rewritten to their American form before comparison.
///
/// Hand-curated and skewed towards obstetric and neonatal vocabulary. Replace
/// with [`normalize_with`] rather than growing this list for other domains.
pub const SPELLING_VARIANTS: &[(&str, &str)] = &[
    ("caesarean", "cesarean"),
    ("randomised", "randomized"),
    ("randomisation", "randomization"),
    ("foetal", "fetal"),
    ("foetus", "fetus"),
    ("paediatric", "pediatric"),
    ("haemorrhage", "hemorrhage"),
    ("anaemia", "anemia"),
    ("oedema", "edema"),
    ("oestrogen", "estrogen"),
    ("anaesthesia", "anesthesia"),
    ("labour", "labor"),
];

static HTML_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static DEFAULT_SPELLINGS: Lazy<SpellingTable> =
    Lazy::new(|| SpellingTable::new(SPELLING_VARIANTS));

/// A compiled spelling-variant table
#[derive(Debug, Clone)]
pub struct SpellingTable {
    pattern: Option<Regex>,
    pairs: Vec<(String, String)>,
}

impl SpellingTable {
    /// Compile a table of `(variant, canonical)` pairs.
    ///
    /// Keys are matched against lowercased text, so they must be lowercase.
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(from, to)| (from.to_lowercase(), to.to_lowercase()))
            .collect();

        // Longest first so "randomisation" wins over a shorter shared prefix
        let mut keys: Vec<&str> = pairs.iter().map(|(from, _)| from.as_str()).collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&alternation).ok()
        };

        Self { pattern, pairs }
    }

    /// Rewrite every variant occurring in `text`
    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Some(re) => re
                .replace_all(text, |caps: &regex::Captures| {
                    let matched = &caps[0];
                    self.pairs
                        .iter()
                        .find(|(from, _)| from == matched)
                        .map(|(_, to)| to.clone())
                        .unwrap_or_else(|| matched.to_string())
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

impl Default for SpellingTable {
    fn default() -> Self {
        DEFAULT_SPELLINGS.clone()
    }
}

/// Decode HTML character references (`&amp;`, `&#233;`, `&eacute;`).
///
/// Unknown named references are left untouched.
pub fn unescape_html(text: &str) -> String {
    HTML_ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
            } else {
                quick_xml::escape::resolve_html5_entity(body).map(String::from)
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Canonicalize free text using the default spelling table.
///
/// Steps: HTML unescape, NFKC, lowercase, whitespace collapse, spelling
/// rewrite, removal of everything that is not alphanumeric or a space, then a
/// second spelling rewrite for variants the stripping joined back together.
/// The result is idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    normalize_with(text, &DEFAULT_SPELLINGS)
}

/// Canonicalize free text with a caller-supplied spelling table
pub fn normalize_with(text: &str, spellings: &SpellingTable) -> String {
    if text.is_empty() {
        return String::new();
    }

    let unescaped = unescape_html(text);
    let folded: String = unescaped.nfkc().collect::<String>().to_lowercase();
    let collapsed = WHITESPACE_RE.replace_all(&folded, " ");
    let respelled = spellings.apply(collapsed.trim());

    let stripped: String = respelled
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    // Stripping "a - b" leaves a double space behind
    let collapsed = WHITESPACE_RE.replace_all(stripped.trim(), " ");
    spellings.apply(&collapsed)
}

/// Canonicalize a single surname: NFKC, keep word characters and hyphens, lowercase
pub fn normalize_surname(name: &str) -> String {
    name.nfkc()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_surname() {
        assert_eq!(normalize_surname("O'Brien"), "obrien");
        assert_eq!(normalize_surname("García-Márquez"), "garcía-márquez");
        assert_eq!(normalize_surname("Smith."), "smith");
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  Effects of X  on Y. "), "effects of x on y");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_html_entities() {
        assert_eq!(normalize("Mother &amp; Child"), "mother child");
        assert_eq!(normalize("Caf&eacute; &#233;tude"), "café étude");
        assert_eq!(normalize("&#x41;BC"), "abc");
    }

    #[test]
    fn test_normalize_unicode_compat() {
        // Full-width letters and the "ﬁ" ligature fold under NFKC
        assert_eq!(normalize("ＡＢＣ ﬁbrosis"), "abc fibrosis");
    }

    #[test]
    fn test_normalize_spelling_variants() {
        assert_eq!(
            normalize("Randomised trial of Caesarean delivery and foetal outcome"),
            "randomized trial of cesarean delivery and fetal outcome"
        );
        assert_eq!(normalize("Paediatric anaemia"), "pediatric anemia");
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("X-ray: a (short) review!"), "xray a short review");
        assert_eq!(normalize("a - b"), "a b");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "Smith J, Doe A. Effects of X on Y. J Med. 2020;10:1-9.",
            "Randomised  trial — caesarean &amp; labour",
            "ＡＢＣ ﬁbrosis - (2019)",
            "Cae-sarean section",
            "labo.ur ward",
            "   ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_normalize_rejoins_split_variants() {
        assert_eq!(normalize("Cae-sarean section"), "cesarean section");
        assert_eq!(normalize("labo.ur ward"), "labor ward");
    }

    #[test]
    fn test_unknown_entity_left_alone() {
        assert_eq!(unescape_html("a &notanentity; b"), "a &notanentity; b");
        assert_eq!(unescape_html("Smith & Jones"), "Smith & Jones");
    }

    #[test]
    fn test_custom_spelling_table() {
        let table = SpellingTable::new(&[("colour", "color")]);
        assert_eq!(normalize_with("Colour vision", &table), "color vision");
        // The default table is not consulted
        assert_eq!(normalize_with("foetal", &table), "foetal");
    }
}

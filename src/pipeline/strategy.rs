//! Resolution strategies, tried in order until one settles the reference.

use async_trait::async_trait;
use std::sync::Arc;

use crate::matching::{
    authors_match, normalize, title_matches_strict, year_matches, YEAR_TOLERANCE,
};
use crate::models::{CandidateRecord, MatchMethod, MissReason, SearchQuery};
use crate::parser::ExtractedFields;
use crate::sources::Source;

use super::ResolverOptions;

/// Everything a strategy may look at for one reference
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub line: &'a str,
    pub fields: &'a ExtractedFields,
    pub options: &'a ResolverOptions,
}

/// Result of one strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// A record was accepted; resolution stops here
    Matched(CandidateRecord, MatchMethod),
    /// A record was found but contradicts the reference; resolution stops here
    Rejected(MissReason, MatchMethod),
    /// Nothing usable; the next strategy runs. Carries the method tried, if any
    Miss(Option<MatchMethod>),
}

/// One step of the matching cascade
#[async_trait]
pub trait ResolutionStrategy: Send + Sync + std::fmt::Debug {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Try to resolve the reference in `ctx`
    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Attempt;
}

/// Re-verify a search-sourced record against the reference.
///
/// Title, then year, then authors; the first disagreement wins. Non-strict mode
/// accepts everything.
pub fn verify_candidate(
    line: &str,
    fields: &ExtractedFields,
    record: &CandidateRecord,
    strict: bool,
) -> Result<(), MissReason> {
    if !strict {
        return Ok(());
    }
    if !title_matches_strict(line, &record.title) {
        return Err(MissReason::TitleMismatch);
    }
    if !year_matches(fields.year, &record.years, YEAR_TOLERANCE) {
        return Err(MissReason::YearMismatch);
    }
    if !authors_match(&fields.authors, &record.authors) {
        return Err(MissReason::AuthorMismatch);
    }
    Ok(())
}

/// Look the extracted DOI up in the primary registry
#[derive(Debug, Clone)]
pub struct DoiLookup {
    source: Arc<dyn Source>,
}

impl DoiLookup {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ResolutionStrategy for DoiLookup {
    fn name(&self) -> &'static str {
        "doi"
    }

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Attempt {
        let Some(doi) = ctx.fields.doi.as_deref() else {
            return Attempt::Miss(None);
        };

        match self.source.get_by_doi(doi).await {
            Ok(record) => Attempt::Matched(record, MatchMethod::DirectDoi),
            Err(e) => {
                tracing::debug!(doi, error = %e, "DOI lookup failed, falling back to search");
                Attempt::Miss(Some(MatchMethod::DirectDoi))
            }
        }
    }
}

/// Free-text search of the primary registry with the whole reference line
#[derive(Debug, Clone)]
pub struct BibliographicSearch {
    source: Arc<dyn Source>,
}

impl BibliographicSearch {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ResolutionStrategy for BibliographicSearch {
    fn name(&self) -> &'static str {
        "bibliographic"
    }

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Attempt {
        // Reaching this step with a DOI means the direct lookup already failed
        let method = if ctx.fields.doi.is_some() {
            MatchMethod::DoiFallbackToBibliographic
        } else {
            MatchMethod::Bibliographic
        };

        let query = SearchQuery::new(ctx.line).max_results(ctx.options.search_rows);
        let candidates = match self.source.search_bibliographic(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(source = self.source.id(), error = %e, "Bibliographic search failed");
                return Attempt::Miss(Some(method));
            }
        };

        let chosen = if ctx.options.strict {
            candidates.into_iter().find(|candidate| {
                title_matches_strict(ctx.line, &candidate.title)
                    && authors_match(&ctx.fields.authors, &candidate.authors)
            })
        } else {
            candidates.into_iter().next()
        };

        let Some(record) = chosen else {
            return Attempt::Miss(Some(method));
        };

        match verify_candidate(ctx.line, ctx.fields, &record, ctx.options.strict) {
            Ok(()) => Attempt::Matched(record, method),
            Err(reason) => {
                tracing::debug!(%reason, title = %record.title, "Candidate rejected");
                Attempt::Rejected(reason, method)
            }
        }
    }
}

/// Whole-citation search of the secondary registry; the top hit is accepted
#[derive(Debug, Clone)]
pub struct FullCitationSearch {
    source: Arc<dyn Source>,
}

impl FullCitationSearch {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ResolutionStrategy for FullCitationSearch {
    fn name(&self) -> &'static str {
        "pubmed_full"
    }

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Attempt {
        match self
            .source
            .search_full_citation(ctx.line, ctx.options.secondary_rows)
            .await
        {
            Ok(hits) => match hits.into_iter().next() {
                Some(record) => Attempt::Matched(record, MatchMethod::PubMedFullCitation),
                None => Attempt::Miss(None),
            },
            Err(e) => {
                tracing::warn!(source = self.source.id(), error = %e, "Full-citation search failed");
                Attempt::Miss(None)
            }
        }
    }
}

/// Exact-title search of the secondary registry using the title guess.
///
/// Only a hit whose normalized title equals the normalized guess is accepted.
#[derive(Debug, Clone)]
pub struct ExactTitleSearch {
    source: Arc<dyn Source>,
}

impl ExactTitleSearch {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ResolutionStrategy for ExactTitleSearch {
    fn name(&self) -> &'static str {
        "pubmed_title"
    }

    async fn attempt(&self, ctx: &ResolutionContext<'_>) -> Attempt {
        let Some(guess) = ctx.fields.title_guess.as_deref() else {
            return Attempt::Miss(None);
        };
        let wanted = normalize(guess);
        if wanted.is_empty() {
            return Attempt::Miss(None);
        }

        match self
            .source
            .search_exact_title(guess, ctx.options.secondary_rows)
            .await
        {
            Ok(hits) => hits
                .into_iter()
                .find(|hit| normalize(&hit.title) == wanted)
                .map_or(Attempt::Miss(None), |record| {
                    Attempt::Matched(record, MatchMethod::PubMedTitleExact)
                }),
            Err(e) => {
                tracing::warn!(source = self.source.id(), error = %e, "Exact-title search failed");
                Attempt::Miss(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::sources::mock::make_record;
    use crate::sources::MockSource;

    const LINE: &str = "Smith J, Doe A. Effects of X on Y. J Med. 2019;10:1-9.";

    fn ctx<'a>(fields: &'a ExtractedFields, options: &'a ResolverOptions) -> ResolutionContext<'a> {
        ResolutionContext {
            line: LINE,
            fields,
            options,
        }
    }

    fn crossref(title: &str, years: &[i32], authors: &[&str]) -> CandidateRecord {
        make_record("10.1000/xyz", title, years, authors, SourceType::CrossRef)
    }

    #[test]
    fn test_verify_order_title_first() {
        let fields = ExtractedFields::from_line(LINE);
        let record = crossref("Completely unrelated study", &[1990], &["Nobody"]);
        assert_eq!(
            verify_candidate(LINE, &fields, &record, true),
            Err(MissReason::TitleMismatch)
        );
        assert_eq!(verify_candidate(LINE, &fields, &record, false), Ok(()));
    }

    #[test]
    fn test_verify_year_then_authors() {
        let fields = ExtractedFields::from_line(LINE);
        assert_eq!(
            verify_candidate(LINE, &fields, &crossref("Effects of X on Y", &[2021], &["Smith"]), true),
            Err(MissReason::YearMismatch)
        );
        assert_eq!(
            verify_candidate(LINE, &fields, &crossref("Effects of X on Y", &[2020], &["Brown"]), true),
            Err(MissReason::AuthorMismatch)
        );
        assert_eq!(
            verify_candidate(LINE, &fields, &crossref("Effects of X on Y", &[2020], &["Smith"]), true),
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_doi_lookup_without_doi_is_silent_miss() {
        let source = Arc::new(MockSource::new("crossref"));
        let fields = ExtractedFields::from_line(LINE);
        let options = ResolverOptions::default();

        let attempt = DoiLookup::new(source.clone()).attempt(&ctx(&fields, &options)).await;
        assert_eq!(attempt, Attempt::Miss(None));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bibliographic_skips_candidates_failing_title_or_authors() {
        let source = Arc::new(MockSource::new("crossref").with_search_results(vec![
            crossref("Some other paper about Z", &[2019], &["Smith"]),
            crossref("Effects of X on Y", &[2019], &["Lee"]),
            crossref("Effects of X on Y", &[2019], &["Doe"]),
        ]));
        let fields = ExtractedFields::from_line(LINE);
        let options = ResolverOptions::default();

        match BibliographicSearch::new(source).attempt(&ctx(&fields, &options)).await {
            Attempt::Matched(record, method) => {
                assert_eq!(method, MatchMethod::Bibliographic);
                assert_eq!(record.authors, vec!["Doe"]);
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bibliographic_non_strict_takes_first() {
        let source = Arc::new(MockSource::new("crossref").with_search_results(vec![
            crossref("Unrelated", &[1990], &["Nobody"]),
        ]));
        let fields = ExtractedFields::from_line(LINE);
        let options = ResolverOptions::default().strict(false);

        let attempt = BibliographicSearch::new(source).attempt(&ctx(&fields, &options)).await;
        assert!(matches!(attempt, Attempt::Matched(_, MatchMethod::Bibliographic)));
    }

    #[tokio::test]
    async fn test_bibliographic_error_degrades_to_miss() {
        let source = Arc::new(MockSource::new("crossref").failing());
        let fields = ExtractedFields::from_line(LINE);
        let options = ResolverOptions::default();

        let attempt = BibliographicSearch::new(source).attempt(&ctx(&fields, &options)).await;
        assert_eq!(attempt, Attempt::Miss(Some(MatchMethod::Bibliographic)));
    }

    #[tokio::test]
    async fn test_exact_title_requires_normalized_equality() {
        let hits = vec![
            make_record("", "Effects of X on Y in adults", &[], &[], SourceType::PubMed),
            make_record("10.1/pm", "Effects of X on Y.", &[], &[], SourceType::PubMed),
        ];
        let source = Arc::new(MockSource::new("pubmed").with_title_results(hits));
        let fields = ExtractedFields::from_line(LINE);
        let options = ResolverOptions::default();

        match ExactTitleSearch::new(source).attempt(&ctx(&fields, &options)).await {
            Attempt::Matched(record, method) => {
                assert_eq!(method, MatchMethod::PubMedTitleExact);
                assert_eq!(record.doi.as_deref(), Some("10.1/pm"));
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_citation_takes_top_hit() {
        let hits = vec![
            make_record("10.1/first", "Anything", &[], &[], SourceType::PubMed),
            make_record("10.1/second", "Else", &[], &[], SourceType::PubMed),
        ];
        let source = Arc::new(MockSource::new("pubmed").with_citation_results(hits));
        let fields = ExtractedFields::from_line(LINE);
        let options = ResolverOptions::default();

        match FullCitationSearch::new(source).attempt(&ctx(&fields, &options)).await {
            Attempt::Matched(record, MatchMethod::PubMedFullCitation) => {
                assert_eq!(record.doi.as_deref(), Some("10.1/first"));
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }
}

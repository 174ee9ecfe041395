//! Reference resolution pipeline.
//!
//! [`Resolver`] runs an ordered list of [`ResolutionStrategy`] values against
//! each reference line:
//!
//! 1. [`DoiLookup`]: resolve the extracted DOI in the primary registry
//! 2. [`BibliographicSearch`]: search the primary registry with the whole line
//! 3. [`FullCitationSearch`]: whole-citation search in the secondary registry
//! 4. [`ExactTitleSearch`]: title-phrase search in the secondary registry
//!
//! The first strategy that matches or rejects a record settles the verdict.
//! Registry failures never abort a resolution; they count as "no result" for
//! the call that failed. References are resolved one after another, in input
//! order.

mod retraction;
mod strategy;

use std::sync::Arc;

pub use retraction::{check_retraction, is_retraction_type, retraction_notices, RETRACTION_TYPES};
pub use strategy::{
    verify_candidate, Attempt, BibliographicSearch, DoiLookup, ExactTitleSearch,
    FullCitationSearch, ResolutionContext, ResolutionStrategy,
};

use crate::config::Config;
use crate::models::{
    CandidateRecord, DebugCandidate, MatchMethod, MatchVerdict, MissReason, SearchQuery,
};
use crate::parser::ExtractedFields;
use crate::sources::{CrossRefSource, PubMedSource, Source, SourceError};

const SCHOLAR_SEARCH_URL: &str = "https://scholar.google.com/scholar?q=";
const PUBMED_SEARCH_URL: &str = "https://pubmed.ncbi.nlm.nih.gov/?term=";

/// Knobs for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Require title/year/author agreement on search-based matches
    pub strict: bool,
    /// Attach primary-registry candidates to misses
    pub debug: bool,
    /// Candidates requested from bibliographic search
    pub search_rows: usize,
    /// Candidates attached to misses in debug mode
    pub debug_rows: usize,
    /// Hits requested from the secondary registry
    pub secondary_rows: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            strict: true,
            debug: false,
            search_rows: 5,
            debug_rows: 3,
            secondary_rows: 5,
        }
    }
}

impl ResolverOptions {
    /// Options from the `[resolution]` section of `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            strict: config.resolution.strict,
            debug: false,
            search_rows: config.resolution.search_rows,
            debug_rows: config.resolution.debug_rows,
            secondary_rows: config.resolution.pubmed_rows,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Resolves reference lines to verdicts against a primary and a secondary registry
#[derive(Debug)]
pub struct Resolver {
    primary: Arc<dyn Source>,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    options: ResolverOptions,
}

impl Resolver {
    /// Standard cascade: DOI, bibliographic, full citation, exact title
    pub fn new(
        primary: Arc<dyn Source>,
        secondary: Arc<dyn Source>,
        options: ResolverOptions,
    ) -> Self {
        let strategies: Vec<Box<dyn ResolutionStrategy>> = vec![
            Box::new(DoiLookup::new(Arc::clone(&primary))),
            Box::new(BibliographicSearch::new(Arc::clone(&primary))),
            Box::new(FullCitationSearch::new(Arc::clone(&secondary))),
            Box::new(ExactTitleSearch::new(secondary)),
        ];
        Self::with_strategies(primary, strategies, options)
    }

    /// Custom cascade; `primary` still serves retraction checks and debug candidates
    pub fn with_strategies(
        primary: Arc<dyn Source>,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            primary,
            strategies,
            options,
        }
    }

    /// CrossRef as primary and PubMed as secondary, configured from `config`
    pub fn from_config(config: &Config, options: ResolverOptions) -> Result<Self, SourceError> {
        let primary: Arc<dyn Source> = Arc::new(CrossRefSource::from_config(config)?);
        let secondary: Arc<dyn Source> = Arc::new(PubMedSource::from_config(config)?);
        Ok(Self::new(primary, secondary, options))
    }

    /// Resolve one reference line. Always yields a verdict.
    pub async fn resolve(&self, line: &str) -> MatchVerdict {
        let fields = ExtractedFields::from_line(line);
        let ctx = ResolutionContext {
            line,
            fields: &fields,
            options: &self.options,
        };

        let mut last_method = None;
        for strategy in &self.strategies {
            match strategy.attempt(&ctx).await {
                Attempt::Matched(record, method) => {
                    tracing::debug!(strategy = strategy.name(), %method, "Reference matched");
                    return self.annotate_found(line, &record, method).await;
                }
                Attempt::Rejected(reason, method) => {
                    tracing::debug!(strategy = strategy.name(), %reason, "Reference rejected");
                    return MatchVerdict::not_found(line, reason, Some(method));
                }
                Attempt::Miss(method) => {
                    if method.is_some() {
                        last_method = method;
                    }
                }
            }
        }

        tracing::debug!("No strategy matched");
        let verdict = MatchVerdict::not_found(line, MissReason::NoMatch, last_method);
        let candidates = if self.options.debug {
            self.debug_candidates(line).await
        } else {
            Vec::new()
        };
        verdict.with_diagnostics(candidates, suggestions(&fields))
    }

    /// Resolve every line in order, one at a time
    pub async fn resolve_all(&self, lines: &[String]) -> Vec<MatchVerdict> {
        self.resolve_all_with(lines, |_, _| {}).await
    }

    /// Like [`Resolver::resolve_all`], calling `on_verdict(index, verdict)` after each line
    pub async fn resolve_all_with<F>(&self, lines: &[String], mut on_verdict: F) -> Vec<MatchVerdict>
    where
        F: FnMut(usize, &MatchVerdict),
    {
        let mut verdicts = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let verdict = self.resolve(line).await;
            tracing::info!(
                reference = index + 1,
                found = verdict.is_found(),
                retracted = verdict.is_retracted(),
                method = verdict.method().map(|m| m.label()).unwrap_or("-"),
                "Reference resolved"
            );
            on_verdict(index, &verdict);
            verdicts.push(verdict);
        }
        verdicts
    }

    async fn annotate_found(
        &self,
        line: &str,
        record: &CandidateRecord,
        method: MatchMethod,
    ) -> MatchVerdict {
        let notices = match record.doi.as_deref() {
            Some(doi) if self.primary.supports_update_notices() => {
                match check_retraction(self.primary.as_ref(), doi).await {
                    Ok((_, notices)) => notices,
                    Err(e) => {
                        tracing::warn!(doi, error = %e, "Retraction check failed");
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };
        MatchVerdict::found(line, record, method, notices)
    }

    async fn debug_candidates(&self, line: &str) -> Vec<DebugCandidate> {
        let query = SearchQuery::new(line).max_results(self.options.debug_rows);
        match self.primary.search_bibliographic(&query).await {
            Ok(records) => records
                .iter()
                .take(self.options.debug_rows)
                .map(DebugCandidate::from)
                .collect(),
            Err(e) => {
                tracing::debug!(error = %e, "Debug candidate search failed");
                Vec::new()
            }
        }
    }
}

/// Web-search URLs an operator can follow to look the title guess up by hand
pub fn suggestions(fields: &ExtractedFields) -> Vec<String> {
    let Some(title) = fields.title_guess.as_deref().map(str::trim) else {
        return Vec::new();
    };
    if title.is_empty() {
        return Vec::new();
    }
    let encoded = urlencoding::encode(title);
    vec![
        format!("{}{}", SCHOLAR_SEARCH_URL, encoded),
        format!("{}{}", PUBMED_SEARCH_URL, encoded),
    ]
}

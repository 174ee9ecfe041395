//! Verdict model: the outcome of resolving one reference line.
//!
//! A verdict is either a match or a miss. Retraction notices only exist on the
//! match side, so a retracted-but-not-found verdict cannot be constructed.

use serde::{Deserialize, Serialize};

use super::{CandidateRecord, RetractionNotice, SourceType};

/// The strategy that produced (or last attempted) a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMethod {
    /// The reference carried a DOI that the primary registry resolved
    #[serde(rename = "doi")]
    DirectDoi,
    /// The reference carried a DOI that did not resolve; the full line was searched instead
    #[serde(rename = "doi->bibliographic")]
    DoiFallbackToBibliographic,
    /// Free-text bibliographic search on the primary registry
    #[serde(rename = "bibliographic")]
    Bibliographic,
    /// Full-citation search on the secondary registry
    #[serde(rename = "pubmed_full")]
    PubMedFullCitation,
    /// Exact-title search on the secondary registry
    #[serde(rename = "pubmed_title")]
    PubMedTitleExact,
}

impl MatchMethod {
    /// Short machine-readable label
    pub fn label(&self) -> &'static str {
        match self {
            MatchMethod::DirectDoi => "doi",
            MatchMethod::DoiFallbackToBibliographic => "doi->bibliographic",
            MatchMethod::Bibliographic => "bibliographic",
            MatchMethod::PubMedFullCitation => "pubmed_full",
            MatchMethod::PubMedTitleExact => "pubmed_title",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a reference was not resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Nothing plausible exists in either registry
    NoMatch,
    /// A record was found but its title does not correspond to the reference
    TitleMismatch,
    /// A record was found but none of its years is close to the reference year
    YearMismatch,
    /// A record was found but no author surname overlaps
    AuthorMismatch,
}

impl MissReason {
    pub fn label(&self) -> &'static str {
        match self {
            MissReason::NoMatch => "no_match",
            MissReason::TitleMismatch => "title_mismatch",
            MissReason::YearMismatch => "year_mismatch",
            MissReason::AuthorMismatch => "author_mismatch",
        }
    }
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A primary-registry candidate attached to a miss for diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugCandidate {
    pub doi: Option<String>,
    pub title: String,
    pub year: Option<i32>,
    pub container_title: Option<String>,
    pub page: Option<String>,
}

impl From<&CandidateRecord> for DebugCandidate {
    fn from(record: &CandidateRecord) -> Self {
        Self {
            doi: record.doi.clone(),
            title: record.title.clone(),
            year: record.first_year(),
            container_title: record.container_title.clone(),
            page: record.page.clone(),
        }
    }
}

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    Found {
        doi: Option<String>,
        title: String,
        method: MatchMethod,
        source: SourceType,
        /// Non-empty iff the work is retracted
        retraction_notices: Vec<RetractionNotice>,
    },
    NotFound {
        reason: MissReason,
        /// Last primary-registry method attempted, if any
        method: Option<MatchMethod>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        debug_candidates: Vec<DebugCandidate>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        suggestions: Vec<String>,
    },
}

/// The verdict for one input reference line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchVerdict {
    /// The reference line as given
    pub input: String,

    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

impl MatchVerdict {
    /// A verdict for a matched record, with its retraction notices
    pub fn found(
        input: impl Into<String>,
        record: &CandidateRecord,
        method: MatchMethod,
        retraction_notices: Vec<RetractionNotice>,
    ) -> Self {
        Self {
            input: input.into(),
            outcome: MatchOutcome::Found {
                doi: record.doi.clone(),
                title: record.title.clone(),
                method,
                source: record.source.clone(),
                retraction_notices,
            },
        }
    }

    /// A verdict for an unresolved reference
    pub fn not_found(
        input: impl Into<String>,
        reason: MissReason,
        method: Option<MatchMethod>,
    ) -> Self {
        Self {
            input: input.into(),
            outcome: MatchOutcome::NotFound {
                reason,
                method,
                debug_candidates: Vec::new(),
                suggestions: Vec::new(),
            },
        }
    }

    /// Attach diagnostics to a miss; no-op on a match
    pub fn with_diagnostics(
        mut self,
        candidates: Vec<DebugCandidate>,
        hints: Vec<String>,
    ) -> Self {
        if let MatchOutcome::NotFound {
            debug_candidates,
            suggestions,
            ..
        } = &mut self.outcome
        {
            *debug_candidates = candidates;
            *suggestions = hints;
        }
        self
    }

    pub fn is_found(&self) -> bool {
        matches!(self.outcome, MatchOutcome::Found { .. })
    }

    pub fn is_retracted(&self) -> bool {
        match &self.outcome {
            MatchOutcome::Found {
                retraction_notices, ..
            } => !retraction_notices.is_empty(),
            MatchOutcome::NotFound { .. } => false,
        }
    }

    /// Whether the report should list this entry as a problem
    pub fn is_problem(&self) -> bool {
        !self.is_found() || self.is_retracted()
    }

    pub fn doi(&self) -> Option<&str> {
        match &self.outcome {
            MatchOutcome::Found { doi, .. } => doi.as_deref(),
            MatchOutcome::NotFound { .. } => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match &self.outcome {
            MatchOutcome::Found { title, .. } => Some(title.as_str()),
            MatchOutcome::NotFound { .. } => None,
        }
    }

    pub fn method(&self) -> Option<MatchMethod> {
        match &self.outcome {
            MatchOutcome::Found { method, .. } => Some(*method),
            MatchOutcome::NotFound { method, .. } => *method,
        }
    }

    /// Miss reason, `None` for matches
    pub fn note(&self) -> Option<MissReason> {
        match &self.outcome {
            MatchOutcome::Found { .. } => None,
            MatchOutcome::NotFound { reason, .. } => Some(*reason),
        }
    }

    pub fn retraction_notices(&self) -> &[RetractionNotice] {
        match &self.outcome {
            MatchOutcome::Found {
                retraction_notices, ..
            } => retraction_notices,
            MatchOutcome::NotFound { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;

    fn record() -> CandidateRecord {
        RecordBuilder::new("10.1000/xyz", "Effects of X on Y", SourceType::CrossRef)
            .doi("10.1000/xyz")
            .year(2020)
            .build()
    }

    #[test]
    fn test_found_verdict_accessors() {
        let verdict = MatchVerdict::found("line", &record(), MatchMethod::DirectDoi, vec![]);
        assert!(verdict.is_found());
        assert!(!verdict.is_retracted());
        assert!(!verdict.is_problem());
        assert_eq!(verdict.doi(), Some("10.1000/xyz"));
        assert_eq!(verdict.title(), Some("Effects of X on Y"));
        assert_eq!(verdict.method(), Some(MatchMethod::DirectDoi));
        assert_eq!(verdict.note(), None);
    }

    #[test]
    fn test_not_found_has_no_doi_or_title() {
        let verdict = MatchVerdict::not_found("line", MissReason::YearMismatch, None);
        assert!(!verdict.is_found());
        assert!(!verdict.is_retracted());
        assert!(verdict.is_problem());
        assert!(verdict.doi().is_none());
        assert!(verdict.title().is_none());
        assert_eq!(verdict.note(), Some(MissReason::YearMismatch));
    }

    #[test]
    fn test_retracted_verdict() {
        let notice = RetractionNotice {
            notice_doi: Some("10.1000/notice".into()),
            update_type: "retraction".into(),
            source: Some("publisher".into()),
            updated: None,
            label: Some("Retraction".into()),
        };
        let verdict =
            MatchVerdict::found("line", &record(), MatchMethod::Bibliographic, vec![notice]);
        assert!(verdict.is_found());
        assert!(verdict.is_retracted());
        assert!(verdict.is_problem());
        assert_eq!(verdict.retraction_notices().len(), 1);
    }

    #[test]
    fn test_diagnostics_ignored_on_found() {
        let verdict = MatchVerdict::found("line", &record(), MatchMethod::DirectDoi, vec![])
            .with_diagnostics(vec![DebugCandidate::from(&record())], vec!["hint".into()]);
        assert!(verdict.is_found());
    }

    #[test]
    fn test_verdict_serialization() {
        let verdict = MatchVerdict::not_found(
            "Smith J. Missing.",
            MissReason::NoMatch,
            Some(MatchMethod::DoiFallbackToBibliographic),
        );
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["reason"], "no_match");
        assert_eq!(json["method"], "doi->bibliographic");
        assert!(json.get("debug_candidates").is_none());
    }
}

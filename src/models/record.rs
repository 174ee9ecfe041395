//! Candidate record model representing a bibliographic work returned by a registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The registry a candidate record came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    CrossRef,
    PubMed,
    #[serde(untagged)]
    Other(String),
}

impl SourceType {
    /// Returns the display name of the registry
    pub fn name(&self) -> &str {
        match self {
            SourceType::CrossRef => "CrossRef",
            SourceType::PubMed => "PubMed",
            SourceType::Other(s) => s,
        }
    }

    /// Returns the registry identifier
    pub fn id(&self) -> &str {
        match self {
            SourceType::CrossRef => "crossref",
            SourceType::PubMed => "pubmed",
            SourceType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A bibliographic record returned by a registry
///
/// Crossref works and PubMed summaries are both mapped onto this shape so the
/// matcher never needs to know where a candidate came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Registry-specific identifier (DOI for Crossref, PMID for PubMed)
    pub record_id: String,

    /// Digital Object Identifier, if the registry knows one
    pub doi: Option<String>,

    /// Work title (first title when the registry lists several)
    pub title: String,

    /// Every year the record declares (print, online, issued, ...)
    pub years: BTreeSet<i32>,

    /// Author surnames in registry order
    pub authors: Vec<String>,

    /// Journal or proceedings title
    pub container_title: Option<String>,

    /// Page range
    pub page: Option<String>,

    /// Registry the record came from
    pub source: SourceType,
}

impl CandidateRecord {
    /// Create a record with the required fields
    pub fn new(record_id: impl Into<String>, title: impl Into<String>, source: SourceType) -> Self {
        Self {
            record_id: record_id.into(),
            doi: None,
            title: title.into(),
            years: BTreeSet::new(),
            authors: Vec::new(),
            container_title: None,
            page: None,
            source,
        }
    }

    /// Earliest declared year, used for display
    pub fn first_year(&self) -> Option<i32> {
        self.years.iter().next().copied()
    }
}

/// Builder for constructing CandidateRecord objects
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: CandidateRecord,
}

impl RecordBuilder {
    /// Create a new builder with required fields
    pub fn new(record_id: impl Into<String>, title: impl Into<String>, source: SourceType) -> Self {
        Self {
            record: CandidateRecord::new(record_id, title, source),
        }
    }

    /// Set DOI (empty strings are ignored)
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        let doi = doi.into();
        if !doi.trim().is_empty() {
            self.record.doi = Some(doi.trim().to_string());
        }
        self
    }

    /// Add a declared year
    pub fn year(mut self, year: i32) -> Self {
        self.record.years.insert(year);
        self
    }

    /// Add several declared years
    pub fn years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.record.years.extend(years);
        self
    }

    /// Set author surnames
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set container title
    pub fn container_title(mut self, container: impl Into<String>) -> Self {
        let container = container.into();
        if !container.is_empty() {
            self.record.container_title = Some(container);
        }
        self
    }

    /// Set page range
    pub fn page(mut self, page: impl Into<String>) -> Self {
        let page = page.into();
        if !page.is_empty() {
            self.record.page = Some(page);
        }
        self
    }

    /// Build the record
    pub fn build(self) -> CandidateRecord {
        self.record
    }
}

/// One `update-to` relation declared by an update notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRelation {
    /// DOI of the work being updated
    pub target_doi: Option<String>,

    /// Update type as declared by the registry (e.g. "retraction", "correction")
    pub update_type: String,

    /// Who declared the update (publisher, retraction-watch, ...)
    pub source: Option<String>,

    /// Declared update timestamp
    pub updated: Option<chrono::DateTime<chrono::Utc>>,

    /// Human-readable label
    pub label: Option<String>,
}

/// An update notice indexed by the primary registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNotice {
    /// DOI of the notice itself
    pub notice_doi: Option<String>,

    /// Relations the notice declares
    pub update_to: Vec<UpdateRelation>,
}

/// A notice marking a work retracted, withdrawn, removed or partially retracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetractionNotice {
    pub notice_doi: Option<String>,
    pub update_type: String,
    pub source: Option<String>,
    pub updated: Option<chrono::DateTime<chrono::Utc>>,
    pub label: Option<String>,
}

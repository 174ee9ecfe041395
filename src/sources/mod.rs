//! Registry clients with a trait-based interface.
//!
//! This module defines the [`Source`] trait that the resolution pipeline talks
//! to. Two registries are wired up:
//!
//! - [`CrossRefSource`] - primary registry: DOI lookup, bibliographic search and
//!   update notices (`filter=updates:<doi>,is-update:true`)
//! - [`PubMedSource`] - secondary registry: full-citation search with query
//!   relaxation, and exact-title phrase search
//!
//! [`MockSource`] implements the same trait with canned data for tests.
//!
//! Every method returns a `Result`; the pipeline decides how to degrade. A
//! source that does not support an operation leaves the default body, which
//! returns [`SourceError::NotImplemented`].

mod crossref;
pub mod mock;
mod pubmed;

pub use crossref::CrossRefSource;
pub use mock::MockSource;
pub use pubmed::{extract_key_terms, relaxed_queries, PubMedSource};

use crate::models::{CandidateRecord, SearchQuery, UpdateNotice};
use async_trait::async_trait;

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const DOI_LOOKUP = 1 << 1;
        const UPDATE_NOTICES = 1 << 2;
        const CITATION_SEARCH = 1 << 3;
        const TITLE_SEARCH = 1 << 4;
    }
}

/// The Source trait defines the interface for every bibliographic registry.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Implement `id`, `name` and `capabilities`
/// 3. Override the lookup methods the registry actually supports
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "crossref", "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Whether this source supports free-text bibliographic search
    fn supports_search(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::SEARCH)
    }

    /// Whether this source supports lookup by DOI
    fn supports_doi_lookup(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::DOI_LOOKUP)
    }

    /// Whether this source indexes update notices (retractions, corrections)
    fn supports_update_notices(&self) -> bool {
        self.capabilities()
            .contains(SourceCapabilities::UPDATE_NOTICES)
    }

    // ========== PRIMARY REGISTRY ==========

    /// Fetch a single record by DOI
    async fn get_by_doi(&self, _doi: &str) -> Result<CandidateRecord, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Relevance-ranked free-text search over the whole reference line
    async fn search_bibliographic(
        &self,
        _query: &SearchQuery,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Update notices that declare an update to `doi`
    async fn find_update_notices(&self, _doi: &str) -> Result<Vec<UpdateNotice>, SourceError> {
        Err(SourceError::NotImplemented)
    }

    // ========== SECONDARY REGISTRY ==========

    /// Search with a whole citation string, relaxing the query on empty results
    async fn search_full_citation(
        &self,
        _citation: &str,
        _max_results: usize,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Phrase search restricted to the title field
    async fn search_exact_title(
        &self,
        _title: &str,
        _max_results: usize,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        Err(SourceError::NotImplemented)
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Network or HTTP error (timeouts included)
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

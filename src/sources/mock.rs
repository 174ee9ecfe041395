//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{CandidateRecord, RecordBuilder, SearchQuery, SourceType, UpdateNotice};
use crate::sources::{Source, SourceCapabilities, SourceError};

/// A mock registry that serves canned records.
///
/// DOI lookups are case-insensitive. Every call is logged so tests can assert
/// which operations the pipeline issued.
#[derive(Debug, Default)]
pub struct MockSource {
    id: String,
    records_by_doi: HashMap<String, CandidateRecord>,
    search_results: Vec<CandidateRecord>,
    notices: HashMap<String, Vec<UpdateNotice>>,
    citation_results: Vec<CandidateRecord>,
    title_results: Vec<CandidateRecord>,
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create an empty mock source with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Serve `record` from `get_by_doi` (keyed by its DOI)
    pub fn with_record(mut self, record: CandidateRecord) -> Self {
        if let Some(doi) = &record.doi {
            self.records_by_doi.insert(doi.to_lowercase(), record);
        }
        self
    }

    /// Results returned by `search_bibliographic`, truncated to `max_results`
    pub fn with_search_results(mut self, results: Vec<CandidateRecord>) -> Self {
        self.search_results = results;
        self
    }

    /// Update notices returned for `doi`
    pub fn with_notices(mut self, doi: &str, notices: Vec<UpdateNotice>) -> Self {
        self.notices.insert(doi.to_lowercase(), notices);
        self
    }

    /// Results returned by `search_full_citation`
    pub fn with_citation_results(mut self, results: Vec<CandidateRecord>) -> Self {
        self.citation_results = results;
        self
    }

    /// Results returned by `search_exact_title`
    pub fn with_title_results(mut self, results: Vec<CandidateRecord>) -> Self {
        self.title_results = results;
        self
    }

    /// Make every call fail with a network error
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Operations issued so far, e.g. `"get_by_doi:10.1000/xyz"`
    pub fn calls(&self) -> Vec<String> {
        self.log().clone()
    }

    /// Number of logged calls whose operation name is `operation`
    pub fn call_count(&self, operation: &str) -> usize {
        self.log()
            .iter()
            .filter(|call| call.split(':').next() == Some(operation))
            .count()
    }

    fn log(&self) -> MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_call(&self, operation: &str, argument: &str) -> Result<(), SourceError> {
        self.log().push(format!("{}:{}", operation, argument));
        if self.failing {
            Err(SourceError::Network(format!("mock {} unavailable", self.id)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::all()
    }

    async fn get_by_doi(&self, doi: &str) -> Result<CandidateRecord, SourceError> {
        self.record_call("get_by_doi", doi)?;
        self.records_by_doi
            .get(&doi.to_lowercase())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(doi.to_string()))
    }

    async fn search_bibliographic(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        self.record_call("search_bibliographic", &query.query)?;
        Ok(self
            .search_results
            .iter()
            .take(query.max_results)
            .cloned()
            .collect())
    }

    async fn find_update_notices(&self, doi: &str) -> Result<Vec<UpdateNotice>, SourceError> {
        self.record_call("find_update_notices", doi)?;
        Ok(self
            .notices
            .get(&doi.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn search_full_citation(
        &self,
        citation: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        self.record_call("search_full_citation", citation)?;
        Ok(self.citation_results.iter().take(max_results).cloned().collect())
    }

    async fn search_exact_title(
        &self,
        title: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        self.record_call("search_exact_title", title)?;
        Ok(self.title_results.iter().take(max_results).cloned().collect())
    }
}

/// Helper function to create a mock record for testing.
pub fn make_record(
    doi: &str,
    title: &str,
    years: &[i32],
    authors: &[&str],
    source: SourceType,
) -> CandidateRecord {
    RecordBuilder::new(doi, title, source)
        .doi(doi)
        .years(years.iter().copied())
        .authors(authors.iter().copied())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_doi_lookup_is_case_insensitive() {
        let source = MockSource::new("crossref").with_record(make_record(
            "10.1000/XYZ",
            "Effects of X on Y",
            &[2020],
            &["Smith"],
            SourceType::CrossRef,
        ));

        let record = source.get_by_doi("10.1000/xyz").await.unwrap();
        assert_eq!(record.title, "Effects of X on Y");
        assert!(matches!(
            source.get_by_doi("10.1000/other").await,
            Err(SourceError::NotFound(_))
        ));
        assert_eq!(source.call_count("get_by_doi"), 2);
    }

    #[tokio::test]
    async fn test_mock_failing_logs_and_errors() {
        let source = MockSource::new("pubmed").failing();
        let result = source.search_exact_title("title", 5).await;
        assert!(matches!(result, Err(SourceError::Network(_))));
        assert_eq!(source.calls(), vec!["search_exact_title:title".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_search_respects_max_results() {
        let results = (0..4)
            .map(|i| make_record(&format!("10.1/{i}"), "t", &[], &[], SourceType::CrossRef))
            .collect();
        let source = MockSource::new("crossref").with_search_results(results);
        let found = source
            .search_bibliographic(&SearchQuery::new("q").max_results(3))
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
    }
}

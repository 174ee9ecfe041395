//! PubMed registry client using the E-utilities API.
//!
//! Searches go through `esearch` (JSON) for PMIDs, then `esummary` (JSON) for
//! titles and identifiers. Summaries often lack a DOI; for the first few of
//! those, `efetch` (XML) is consulted as a best-effort backfill.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{CandidateRecord, RecordBuilder, SourceType};
use crate::parser::extract_year;
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::HttpClient;

/// Summaries without a DOI that get an `efetch` backfill attempt
const DOI_BACKFILL_LIMIT: usize = 3;

/// Keywords kept from the title section when building a key-term query
const MAX_KEYWORDS: usize = 8;

/// Capitalised words kept from the author section
const MAX_AUTHOR_WORDS: usize = 3;

static PUNCTUATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[&;,.()\[\]]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b10\.\d{4,9}/\S+").unwrap());
static VOLUME_ISSUE_PAGES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+\(\d+\):\d+-\d+").unwrap());
static VOLUME_PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+:\d+").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static CAPITALISED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+\b").unwrap());

static JOURNAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bBMC\s+\w+",
        r"(?i)\bJ\s+Pediatr",
        r"(?i)\bJAMA",
        r"(?i)\bLancet",
        r"(?i)\bN\s+Engl\s+J\s+Med",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:systematic|review|meta-analysis|randomized|controlled|trial|trials|",
        r"caffeine|therapy|treatment|outcomes|timing|initiation|early|late|",
        r"renal|replacement|kidney|injury|acute|",
        r"birth|weight|infants|infant|neonatal|pediatric|",
        r"association|trends|use|clinical|very|low)\b"
    ))
    .unwrap()
});

/// PubMed registry source
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
    tool: String,
    email: String,
}

impl PubMedSource {
    /// Create a source with default configuration
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Create a source using the contact, transport and endpoint settings in `config`
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::with_user_agent(&config.user_agent(), &config.http)?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Create with a custom HTTP client (for testing)
    pub fn with_client(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: config.endpoints.pubmed.trim_end_matches('/').to_string(),
            tool: config.contact.tool.clone(),
            email: config.contact.email.clone(),
        }
    }

    fn endpoint(&self, utility: &str) -> String {
        format!("{}/{}.fcgi", self.base_url, utility)
    }

    /// Query parameters plus the E-utilities `tool`/`email` etiquette pair
    fn params<'a>(&self, extra: &[(&'a str, String)]) -> Vec<(&'a str, String)> {
        let mut params = extra.to_vec();
        params.push(("tool", self.tool.clone()));
        params.push(("email", self.email.clone()));
        params
    }

    /// Run one `esearch` query and return the PMIDs in relevance order
    async fn esearch(&self, term: &str, retmax: usize) -> Result<Vec<String>, SourceError> {
        let params = self.params(&[
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
            ("retmax", retmax.to_string()),
            ("term", term.to_string()),
        ]);
        let data: ESearchResponse = self
            .client
            .get_json(&self.endpoint("esearch"), &params)
            .await?;
        Ok(data.esearchresult.idlist)
    }

    /// Search a term and resolve the hits to records
    async fn search_term(
        &self,
        term: &str,
        retmax: usize,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        let ids = self.esearch(term, retmax).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_details(&ids).await
    }

    /// Summaries for `pmids`, in the given order, with DOI backfill
    async fn fetch_details(&self, pmids: &[String]) -> Result<Vec<CandidateRecord>, SourceError> {
        let params = self.params(&[
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
            ("id", pmids.join(",")),
        ]);
        let data: ESummaryResponse = self
            .client
            .get_json(&self.endpoint("esummary"), &params)
            .await?;

        let mut records: Vec<CandidateRecord> = pmids
            .iter()
            .filter_map(|pmid| {
                let value = data.result.get(pmid)?;
                match serde_json::from_value::<ESummaryItem>(value.clone()) {
                    Ok(item) => Some(item.into_record(pmid)),
                    Err(e) => {
                        tracing::debug!(pmid = %pmid, error = %e, "Skipping malformed PubMed summary");
                        None
                    }
                }
            })
            .collect();

        let limit = records.len().min(DOI_BACKFILL_LIMIT);
        for record in records.iter_mut().take(limit) {
            if record.doi.is_some() {
                continue;
            }
            match self.fetch_doi(&record.record_id).await {
                Ok(Some(doi)) => record.doi = Some(doi),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(pmid = %record.record_id, error = %e, "DOI backfill failed");
                }
            }
        }

        Ok(records)
    }

    /// DOI for one PMID from the `efetch` XML record
    async fn fetch_doi(&self, pmid: &str) -> Result<Option<String>, SourceError> {
        let params = self.params(&[
            ("db", "pubmed".to_string()),
            ("retmode", "xml".to_string()),
            ("id", pmid.to_string()),
        ]);
        let xml = self
            .client
            .get_text(&self.endpoint("efetch"), &params)
            .await?;
        parse_efetch_doi(&xml)
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::CITATION_SEARCH | SourceCapabilities::TITLE_SEARCH
    }

    async fn search_full_citation(
        &self,
        citation: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        let mut last_error = None;
        let mut any_answered = false;

        for query in relaxed_queries(citation) {
            match self.search_term(&query, max_results).await {
                Ok(records) if !records.is_empty() => return Ok(records),
                Ok(_) => any_answered = true,
                Err(e) => {
                    tracing::debug!(query = %query, error = %e, "PubMed query failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    async fn search_exact_title(
        &self,
        title: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Vec::new());
        }
        self.search_term(&format!("\"{}\"[Title]", title), max_results)
            .await
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Progressively looser queries for a citation string.
///
/// In order: the raw citation, the citation with `&;,.()[]` blanked out, the
/// citation without DOIs and volume/issue/page runs, and finally a key-term
/// query (see [`extract_key_terms`]). Empty and repeated queries are dropped.
pub fn relaxed_queries(citation: &str) -> Vec<String> {
    let raw = citation.trim().to_string();
    let cleaned = collapse_whitespace(&PUNCTUATION_RE.replace_all(citation, " "));

    let simplified = DOI_RE.replace_all(citation, "");
    let simplified = VOLUME_ISSUE_PAGES_RE.replace_all(&simplified, "");
    let simplified = VOLUME_PAGE_RE.replace_all(&simplified, "");
    let simplified = collapse_whitespace(&PUNCTUATION_RE.replace_all(&simplified, " "));

    let mut queries: Vec<String> = Vec::new();
    for query in [raw, cleaned, simplified, extract_key_terms(citation)] {
        if !query.is_empty() && !queries.contains(&query) {
            queries.push(query);
        }
    }
    queries
}

/// Compact query built from the most identifying parts of a citation.
///
/// Year, up to three capitalised words from the author section (before the
/// first period), the first recognised journal abbreviation, and up to eight
/// distinct domain keywords from the rest of the citation.
pub fn extract_key_terms(citation: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(year) = YEAR_RE.find(citation) {
        parts.push(year.as_str().to_string());
    }

    let author_section: String = match citation.split_once('.') {
        Some((head, _)) => head.to_string(),
        None => citation.chars().take(50).collect(),
    };
    parts.extend(
        CAPITALISED_RE
            .find_iter(&author_section)
            .take(MAX_AUTHOR_WORDS)
            .map(|m| m.as_str().to_string()),
    );

    if let Some(journal) = JOURNAL_PATTERNS.iter().find_map(|re| re.find(citation)) {
        parts.push(journal.as_str().to_string());
    }

    let title_section = citation
        .split_once('.')
        .map_or(citation, |(_, rest)| rest);
    let mut seen = HashSet::new();
    parts.extend(
        KEYWORD_RE
            .find_iter(title_section)
            .map(|m| m.as_str())
            .filter(|word| seen.insert(word.to_lowercase()))
            .take(MAX_KEYWORDS)
            .map(str::to_string),
    );

    parts.join(" ")
}

fn parse_efetch_doi(xml: &str) -> Result<Option<String>, SourceError> {
    let set: EFetchArticleSet = from_str(xml)?;
    Ok(set
        .articles
        .into_iter()
        .filter_map(|article| article.pubmed_data?.article_ids)
        .flat_map(|list| list.ids)
        .find(|id| id.id_type.eq_ignore_ascii_case("doi"))
        .map(|id| id.value.trim().to_string())
        .filter(|doi| !doi.is_empty()))
}

// ===== E-utilities API Types =====

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ESummaryItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    articleids: Vec<ESummaryArticleId>,
    #[serde(default)]
    pubdate: String,
    #[serde(default)]
    epubdate: String,
    #[serde(default)]
    sortpubdate: String,
    #[serde(default)]
    authors: Vec<ESummaryAuthor>,
    #[serde(default)]
    fulljournalname: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    pages: String,
}

#[derive(Debug, Deserialize)]
struct ESummaryArticleId {
    #[serde(default)]
    idtype: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ESummaryAuthor {
    #[serde(default)]
    name: String,
}

impl ESummaryItem {
    fn into_record(self, pmid: &str) -> CandidateRecord {
        let doi = self
            .articleids
            .iter()
            .find(|id| id.idtype.eq_ignore_ascii_case("doi"))
            .map(|id| id.value.clone())
            .unwrap_or_default();

        let years = [&self.pubdate, &self.epubdate, &self.sortpubdate]
            .into_iter()
            .filter_map(|date| extract_year(date))
            .collect::<Vec<_>>();

        let authors = self
            .authors
            .iter()
            .filter_map(|a| a.name.split_whitespace().next())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let container = if self.fulljournalname.is_empty() {
            self.source
        } else {
            self.fulljournalname
        };

        RecordBuilder::new(pmid, self.title, SourceType::PubMed)
            .doi(doi)
            .years(years)
            .authors(authors)
            .container_title(container)
            .page(self.pages)
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct EFetchArticleSet {
    #[serde(rename = "PubmedArticle", default)]
    articles: Vec<EFetchArticle>,
}

#[derive(Debug, Deserialize)]
struct EFetchArticle {
    #[serde(rename = "PubmedData")]
    pubmed_data: Option<EFetchPubmedData>,
}

#[derive(Debug, Deserialize)]
struct EFetchPubmedData {
    #[serde(rename = "ArticleIdList")]
    article_ids: Option<EFetchIdList>,
}

#[derive(Debug, Deserialize)]
struct EFetchIdList {
    #[serde(rename = "ArticleId", default)]
    ids: Vec<EFetchArticleId>,
}

#[derive(Debug, Deserialize)]
struct EFetchArticleId {
    #[serde(rename = "@IdType", default)]
    id_type: String,
    #[serde(rename = "$text", default)]
    value: String,
}

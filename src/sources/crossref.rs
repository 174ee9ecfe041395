//! CrossRef registry client.
//!
//! Uses the CrossRef REST API for DOI lookup, bibliographic search, and the
//! update-notice index that carries retractions and corrections.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{
    CandidateRecord, RecordBuilder, SearchQuery, SourceType, UpdateNotice, UpdateRelation,
};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::HttpClient;

/// Upper bound on update notices fetched for one DOI
const MAX_UPDATE_NOTICES: usize = 1000;

/// Fields requested from bibliographic search
const SEARCH_SELECT: &str =
    "DOI,title,author,issued,published-print,published-online,published,container-title,page";

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());

/// CrossRef registry source
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl CrossRefSource {
    /// Create a source with default configuration
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Create a source using the contact, transport and endpoint settings in `config`
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::with_user_agent(&config.user_agent(), &config.http)?;
        Ok(Self::with_client(Arc::new(client), &config.endpoints.crossref))
    }

    /// Create with a custom HTTP client and base URL (for testing)
    pub fn with_client(client: Arc<HttpClient>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn works_url(&self) -> String {
        format!("{}/works", self.base_url)
    }

    /// `/works/<doi>` with each DOI segment percent-encoded and `/` kept
    fn work_url(&self, doi: &str) -> String {
        let encoded = doi
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.works_url(), encoded)
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::DOI_LOOKUP
            | SourceCapabilities::UPDATE_NOTICES
    }

    async fn get_by_doi(&self, doi: &str) -> Result<CandidateRecord, SourceError> {
        let doi = doi.trim();
        if doi.is_empty() {
            return Err(SourceError::InvalidRequest("empty DOI".to_string()));
        }

        let data: CRSingleResponse = self.client.get_json(&self.work_url(doi), &[]).await?;
        Ok(data.message.into_record())
    }

    async fn search_bibliographic(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        if query.query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("query.bibliographic", query.query.clone()),
            ("rows", query.max_results.to_string()),
            ("select", SEARCH_SELECT.to_string()),
        ];
        let data: CRListResponse = self.client.get_json(&self.works_url(), &params).await?;

        Ok(data
            .message
            .items
            .into_iter()
            .map(CRWork::into_record)
            .collect())
    }

    async fn find_update_notices(&self, doi: &str) -> Result<Vec<UpdateNotice>, SourceError> {
        let params = [
            ("filter", format!("updates:{},is-update:true", doi)),
            ("rows", MAX_UPDATE_NOTICES.to_string()),
        ];
        let data: CRListResponse = self.client.get_json(&self.works_url(), &params).await?;

        Ok(data
            .message
            .items
            .into_iter()
            .map(CRWork::into_notice)
            .collect())
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRSingleResponse {
    message: CRWork,
}

#[derive(Debug, Deserialize)]
struct CRListResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRWork>,
}

#[derive(Debug, Deserialize)]
struct CRWork {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CRAuthor>,
    issued: Option<CRDate>,
    #[serde(rename = "published-print")]
    published_print: Option<CRDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CRDate>,
    published: Option<CRDate>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    page: Option<String>,
    #[serde(rename = "update-to", default)]
    update_to: Vec<CRUpdate>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    family: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl CRDate {
    fn year(&self) -> Option<i32> {
        self.date_parts.first()?.first().copied().flatten()
    }
}

#[derive(Debug, Deserialize)]
struct CRUpdate {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "type")]
    update_type: Option<String>,
    source: Option<String>,
    updated: Option<CRUpdated>,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRUpdated {
    #[serde(rename = "date-time")]
    date_time: Option<String>,
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl CRUpdated {
    /// `date-time` when present, otherwise midnight UTC of `date-parts`
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        if let Some(parsed) = self.date_time.as_deref().and_then(parse_timestamp) {
            return Some(parsed);
        }
        let parts = self.date_parts.first()?;
        let year = parts.first().copied().flatten()?;
        let month = parts.get(1).copied().flatten().unwrap_or(1);
        let day = parts.get(2).copied().flatten().unwrap_or(1);
        let date = NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

impl CRWork {
    fn years(&self) -> BTreeSet<i32> {
        [
            &self.issued,
            &self.published_print,
            &self.published_online,
            &self.published,
        ]
        .into_iter()
        .flatten()
        .filter_map(CRDate::year)
        .collect()
    }

    fn into_record(self) -> CandidateRecord {
        let years = self.years();
        let doi = self.doi.unwrap_or_default();
        let title = self
            .title
            .into_iter()
            .next()
            .map(|t| strip_markup(&t))
            .unwrap_or_default();

        let authors = self
            .author
            .into_iter()
            .filter_map(|a| {
                a.family.or_else(|| {
                    a.name
                        .and_then(|name| name.split_whitespace().last().map(str::to_string))
                })
            })
            .filter(|name| !name.trim().is_empty());

        let mut builder = RecordBuilder::new(doi.clone(), title, SourceType::CrossRef)
            .doi(doi)
            .years(years)
            .authors(authors);

        if let Some(container) = self.container_title.into_iter().next() {
            builder = builder.container_title(container);
        }
        if let Some(page) = self.page {
            builder = builder.page(page);
        }

        builder.build()
    }

    fn into_notice(self) -> UpdateNotice {
        UpdateNotice {
            notice_doi: self.doi,
            update_to: self
                .update_to
                .into_iter()
                .map(|u| UpdateRelation {
                    target_doi: u.doi,
                    update_type: u.update_type.unwrap_or_default(),
                    source: u.source,
                    updated: u.updated.as_ref().and_then(CRUpdated::timestamp),
                    label: u.label,
                })
                .collect(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Drop JATS/HTML tags such as `<i>` that CrossRef keeps inside titles
fn strip_markup(title: &str) -> String {
    MARKUP_RE.replace_all(title, "").trim().to_string()
}

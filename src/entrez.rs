//! NCBI E-utilities client.
//!
//! Runs the search with history enabled, then fetches the stored result
//! set as PubMed XML:
//!
//! - ESearch: `db=pubmed&usehistory=y&retmode=json`
//! - EFetch: `db=pubmed&WebEnv=…&query_key=…&retmode=xml`
//!
//! Both requests carry the same `retmax`, so a run never sees more than
//! that many articles.

use crate::article::RawArticle;
use crate::error::{OptionExt, ReportError, Result};
use crate::pubmed_xml;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// E-utilities base URL
pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const DATABASE: &str = "pubmed";

/// Outcome of an ESearch call with a stored history handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Total number of matches reported by PubMed
    pub count: String,
    /// PMIDs returned within `retmax`
    pub ids: Vec<String>,
    pub web_env: String,
    pub query_key: String,
}

/// E-utilities client
pub struct EntrezClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EntrezClient {
    /// Create a new EntrezClient
    ///
    /// # Arguments
    ///
    /// * `base_url` - E-utilities base URL (see [`EUTILS_BASE`])
    /// * `api_key` - NCBI API key (required)
    /// * `user_agent` - User agent sent with each request
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, api_key: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(ReportError::Config("No API key provided".to_string()));
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Search PubMed, keeping the result set on the server.
    pub async fn search(&self, term: &str, retmax: u32) -> Result<SearchResult> {
        let url = build_search_url(&self.base_url, &self.api_key, term, retmax)?;
        debug!(term, retmax, "Sending ESearch request");

        let body = self.get_text(url).await?;
        let result = parse_search_response(&body)?;

        info!(
            returned = result.ids.len(),
            matches = %result.count,
            "Search complete"
        );
        Ok(result)
    }

    /// Fetch the articles of a stored search.
    pub async fn fetch(&self, search: &SearchResult, retmax: u32) -> Result<Vec<RawArticle>> {
        let url = build_fetch_url(&self.base_url, &self.api_key, search, retmax)?;
        debug!(query_key = %search.query_key, "Sending EFetch request");

        let body = self.get_text(url).await?;
        let articles = pubmed_xml::parse_article_set(&body)?;

        info!(count = articles.len(), "Fetched articles");
        Ok(articles)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReportError::Api {
                code: status.as_u16(),
                message: format!("E-utilities error: {} - {}", status, error_text),
            });
        }

        Ok(response.text().await?)
    }
}

/// Build the ESearch URL
fn build_search_url(base: &str, api_key: &str, term: &str, retmax: u32) -> Result<Url> {
    let retmax = retmax.to_string();
    Url::parse_with_params(
        &format!("{}/esearch.fcgi", base),
        &[
            ("db", DATABASE),
            ("api_key", api_key),
            ("term", term),
            ("retmax", retmax.as_str()),
            ("usehistory", "y"),
            ("retmode", "json"),
        ],
    )
    .map_err(|e| ReportError::Config(format!("Invalid E-utilities URL: {}", e)))
}

/// Build the EFetch URL for a stored search
fn build_fetch_url(base: &str, api_key: &str, search: &SearchResult, retmax: u32) -> Result<Url> {
    let retmax = retmax.to_string();
    Url::parse_with_params(
        &format!("{}/efetch.fcgi", base),
        &[
            ("db", DATABASE),
            ("api_key", api_key),
            ("WebEnv", search.web_env.as_str()),
            ("query_key", search.query_key.as_str()),
            ("retmax", retmax.as_str()),
            ("retmode", "xml"),
        ],
    )
    .map_err(|e| ReportError::Config(format!("Invalid E-utilities URL: {}", e)))
}

/// Parse an ESearch JSON body
fn parse_search_response(json: &str) -> Result<SearchResult> {
    let response: ESearchResponse = serde_json::from_str(json)?;
    let result = response.esearchresult;

    if let Some(message) = result.error {
        return Err(ReportError::Api {
            code: 200,
            message: format!("ESearch error: {}", message),
        });
    }

    Ok(SearchResult {
        count: result.count.unwrap_or_default(),
        ids: result.idlist,
        web_env: result.webenv.ok_or_parse("ESearch response has no WebEnv")?,
        query_key: result.querykey.ok_or_parse("ESearch response has no query_key")?,
    })
}

// === ESearch Response Types ===

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(default)]
    webenv: Option<String>,
    #[serde(default)]
    querykey: Option<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

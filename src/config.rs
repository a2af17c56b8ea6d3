//! Run configuration.

use crate::entrez::EUTILS_BASE;
use crate::error::{ReportError, Result};
use crate::wikidata::SPARQL_ENDPOINT;
use std::path::PathBuf;
use std::time::Duration;

/// Literature query the report is built for
pub const DEFAULT_TERM: &str = "\"Rett Syndrome\"[Mesh Major Topic] AND Review[ptyp]";

/// Result cap applied to both search and fetch
pub const DEFAULT_RETMAX: u32 = 5;

pub const DEFAULT_LICENSE_FILE: &str = "oa_file_list.txt";
pub const DEFAULT_OUTPUT: &str = "results.csv";

const DEFAULT_USER_AGENT: &str = concat!("oareport/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Everything one report run needs.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// NCBI OA file list
    pub license_file: PathBuf,
    /// Tab-separated report destination
    pub output: PathBuf,
    pub term: String,
    pub retmax: u32,
    pub api_key: String,
    pub eutils_base: String,
    pub sparql_endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            license_file: PathBuf::from(DEFAULT_LICENSE_FILE),
            output: PathBuf::from(DEFAULT_OUTPUT),
            term: DEFAULT_TERM.to_string(),
            retmax: DEFAULT_RETMAX,
            api_key: String::new(),
            eutils_base: EUTILS_BASE.to_string(),
            sparql_endpoint: SPARQL_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ReportConfig {
    /// Check the settings that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ReportError::Config(
                "No API key provided (set NCBI_API_KEY or --api-key)".to_string(),
            ));
        }
        if self.term.trim().is_empty() {
            return Err(ReportError::Config("Search term is empty".to_string()));
        }
        if self.retmax == 0 {
            return Err(ReportError::Config("retmax must be at least 1".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ReportError::Config("User agent is empty".to_string()));
        }
        Ok(())
    }
}

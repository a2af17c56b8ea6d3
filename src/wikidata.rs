//! Wikidata identifier resolution.
//!
//! Maps batches of external identifiers to Wikidata items through the
//! Wikidata Query Service. One SPARQL query per identifier kind:
//!
//! - PMC id → article item (P932)
//! - ISSN → journal item (P236)
//! - MeSH descriptor UI → drug item and/or disease item (P486), split by
//!   class (instance of medication Q12140 or disease Q12136)
//!
//! Identifiers that match nothing are simply absent from the result.

use crate::error::{ReportError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, info};

/// Wikidata Query Service endpoint
pub const SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";

/// Prefix of entity URIs in SPARQL results
const ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

/// Identifier → Wikidata item id ("Q…")
pub type ItemMap = HashMap<String, String>;

/// Kinds of identifier the report resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    PmcId,
    Issn,
    MeshSubject,
}

impl IdentifierKind {
    /// Wikidata property holding this identifier
    pub fn property(self) -> &'static str {
        match self {
            IdentifierKind::PmcId => "P932",
            IdentifierKind::Issn => "P236",
            IdentifierKind::MeshSubject => "P486",
        }
    }
}

/// Drug and disease items for MeSH subjects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectItems {
    pub drugs: ItemMap,
    pub diseases: ItemMap,
}

/// Wikidata SPARQL client
pub struct WikidataClient {
    client: Client,
    endpoint: String,
}

impl WikidataClient {
    /// Create a new WikidataClient
    ///
    /// # Arguments
    ///
    /// * `endpoint` - SPARQL endpoint URL
    /// * `user_agent` - User agent; the query service rejects anonymous clients
    /// * `timeout` - Per-request timeout
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Resolve PMC ids (without prefix) to article items.
    pub async fn resolve_pmcids(&self, ids: &BTreeSet<String>) -> Result<ItemMap> {
        let bindings = self.run(IdentifierKind::PmcId, ids).await?;
        Ok(collect_items(bindings))
    }

    /// Resolve ISSNs to journal items.
    pub async fn resolve_issns(&self, ids: &BTreeSet<String>) -> Result<ItemMap> {
        let bindings = self.run(IdentifierKind::Issn, ids).await?;
        Ok(collect_items(bindings))
    }

    /// Resolve MeSH descriptor UIs to drug and disease items in one query.
    pub async fn resolve_subjects(&self, ids: &BTreeSet<String>) -> Result<SubjectItems> {
        let bindings = self.run(IdentifierKind::MeshSubject, ids).await?;
        Ok(split_subject_items(bindings))
    }

    async fn run(&self, kind: IdentifierKind, ids: &BTreeSet<String>) -> Result<Vec<Binding>> {
        if ids.is_empty() {
            debug!(?kind, "Nothing to resolve");
            return Ok(Vec::new());
        }

        let query = build_query(kind, ids);
        debug!(?kind, count = ids.len(), "Sending SPARQL query");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query.as_str()), ("format", "json")])
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReportError::Api {
                code: status.as_u16(),
                message: format!("Wikidata query error: {} - {}", status, error_text),
            });
        }

        let body = response.text().await?;
        let bindings = parse_bindings(&body)?;

        info!(?kind, requested = ids.len(), found = bindings.len(), "Resolved identifiers");
        Ok(bindings)
    }
}

/// One result row: identifier, item id and, for subjects, its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub id: String,
    pub item: String,
    pub class: Option<SubjectClass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectClass {
    Drug,
    Disease,
}

impl SubjectClass {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "drug" => Some(SubjectClass::Drug),
            "disease" => Some(SubjectClass::Disease),
            _ => None,
        }
    }
}

/// Build the SPARQL query for a batch of identifiers.
pub fn build_query(kind: IdentifierKind, ids: &BTreeSet<String>) -> String {
    let values = ids
        .iter()
        .map(|id| format!("\"{}\"", escape_literal(id)))
        .collect::<Vec<_>>()
        .join(" ");
    let property = kind.property();

    match kind {
        IdentifierKind::MeshSubject => format!(
            "SELECT ?id ?item ?class WHERE {{ VALUES ?id {{ {values} }} \
             ?item wdt:{property} ?id . \
             {{ ?item wdt:P31 wd:Q12140 . BIND(\"drug\" AS ?class) }} \
             UNION \
             {{ ?item wdt:P31 wd:Q12136 . BIND(\"disease\" AS ?class) }} }}"
        ),
        _ => format!(
            "SELECT ?id ?item WHERE {{ VALUES ?id {{ {values} }} ?item wdt:{property} ?id . }}"
        ),
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Parse a SPARQL JSON result set into bindings.
pub fn parse_bindings(json: &str) -> Result<Vec<Binding>> {
    let response: SparqlResponse = serde_json::from_str(json)?;

    let bindings = response
        .results
        .bindings
        .into_iter()
        .filter_map(|row| {
            let id = row.id?.value;
            let item = item_id(&row.item?.value)?;
            let class = row.class.and_then(|c| SubjectClass::from_tag(&c.value));
            Some(Binding { id, item, class })
        })
        .collect();

    Ok(bindings)
}

/// Reduce an entity URI to its item id.
fn item_id(uri: &str) -> Option<String> {
    let id = uri.strip_prefix(ENTITY_PREFIX).unwrap_or(uri);
    (!id.is_empty()).then(|| id.to_string())
}

/// First item per identifier wins.
fn collect_items(bindings: Vec<Binding>) -> ItemMap {
    let mut items = ItemMap::new();
    for binding in bindings {
        items.entry(binding.id).or_insert(binding.item);
    }
    items
}

fn split_subject_items(bindings: Vec<Binding>) -> SubjectItems {
    let mut subjects = SubjectItems::default();
    for binding in bindings {
        let target = match binding.class {
            Some(SubjectClass::Drug) => &mut subjects.drugs,
            Some(SubjectClass::Disease) => &mut subjects.diseases,
            None => continue,
        };
        target.entry(binding.id).or_insert(binding.item);
    }
    subjects
}

// === SPARQL JSON Response Types ===

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<SparqlRow>,
}

#[derive(Debug, Deserialize)]
struct SparqlRow {
    id: Option<SparqlValue>,
    item: Option<SparqlValue>,
    class: Option<SparqlValue>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

//! Article normalization.
//!
//! Turns fetched citations into [`Record`]s and collects, across the whole
//! pass, the identifiers that still need a Wikidata lookup. Normalizing one
//! article is a pure function; [`normalize_all`] folds the accepted records
//! into [`Worklists`] so the caller makes one batch lookup per identifier
//! kind instead of one per article.

use crate::article::RawArticle;
use crate::license::{LicenseTable, PMC_PREFIX};
use crate::mesh::{self, Subject};
use crate::pubdate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// `IdType` of PubMed Central entries in an `ArticleIdList`
const PMC_ID_TYPE: &str = "pmc";

/// A normalized, licensed article ready for formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub title: String,
    pub pmid: String,
    /// PMC id without its "PMC" prefix
    pub pmcid: Option<String>,
    pub license: String,
    pub subjects: Vec<Subject>,
    pub publication_date: String,
    pub publication: String,
    pub issn: String,
    pub publication_type: String,
}

/// Why an article produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Neither the PMID nor the PMC id is in the license table
    Unlicensed,
    /// The citation has no `Article` element
    MissingArticleBody,
    /// The citation has more than one `Article` element
    AmbiguousArticleBody { count: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unlicensed => f.write_str("no license for PMID or PMC id"),
            Rejection::MissingArticleBody => f.write_str("citation has no article body"),
            Rejection::AmbiguousArticleBody { count } => {
                write!(f, "citation has {} article bodies", count)
            }
        }
    }
}

/// PMC id of the first `pmc` entry, with the "PMC" prefix removed.
pub fn extract_pmcid(article: &RawArticle) -> Option<String> {
    article
        .article_ids
        .iter()
        .find(|id| id.id_type == PMC_ID_TYPE)
        .map(|id| id.id.strip_prefix(PMC_PREFIX).unwrap_or(&id.id).to_string())
        .filter(|id| !id.is_empty())
}

/// Normalize one article, or say why it is dropped.
pub fn normalize(article: &RawArticle, licenses: &LicenseTable) -> Result<Record, Rejection> {
    let pmcid = extract_pmcid(article);

    let license = licenses
        .resolve(&article.pmid, pmcid.as_deref())
        .ok_or(Rejection::Unlicensed)?
        .to_string();

    // Only single-body citations are supported
    let body = match article.bodies.as_slice() {
        [body] => body,
        [] => return Err(Rejection::MissingArticleBody),
        bodies => {
            return Err(Rejection::AmbiguousArticleBody {
                count: bodies.len(),
            })
        }
    };

    Ok(Record {
        title: body.title.clone(),
        pmid: article.pmid.clone(),
        pmcid,
        license,
        subjects: mesh::major_subjects(&article.mesh_headings),
        publication_date: pubdate::resolve(body).text,
        publication: body.journal.title.clone(),
        issn: body.journal.issn.clone(),
        publication_type: body.publication_types.first().cloned().unwrap_or_default(),
    })
}

/// Distinct identifiers awaiting a batch lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worklists {
    pub pmcids: BTreeSet<String>,
    pub issns: BTreeSet<String>,
    pub subject_ids: BTreeSet<String>,
}

impl Worklists {
    /// Add the identifiers of an accepted record.
    pub fn absorb(&mut self, record: &Record) {
        if let Some(pmcid) = &record.pmcid {
            self.pmcids.insert(pmcid.clone());
        }
        if !record.issn.is_empty() {
            self.issns.insert(record.issn.clone());
        }
        self.subject_ids.extend(
            record
                .subjects
                .iter()
                .filter(|s| !s.id.is_empty())
                .map(|s| s.id.clone()),
        );
    }
}

/// Outcome of normalizing a whole fetch.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Accepted records, in article order
    pub records: Vec<Record>,
    pub worklists: Worklists,
    /// Dropped articles as (PMID, reason), in article order
    pub dropped: Vec<(String, Rejection)>,
}

/// Normalize every article and gather the lookup worklists.
pub fn normalize_all(articles: &[RawArticle], licenses: &LicenseTable) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for article in articles {
        match normalize(article, licenses) {
            Ok(record) => {
                batch.worklists.absorb(&record);
                batch.records.push(record);
            }
            Err(reason) => {
                debug!(pmid = %article.pmid, %reason, "Dropping article");
                batch.dropped.push((article.pmid.clone(), reason));
            }
        }
    }

    info!(
        accepted = batch.records.len(),
        dropped = batch.dropped.len(),
        pmcids = batch.worklists.pmcids.len(),
        issns = batch.worklists.issns.len(),
        subjects = batch.worklists.subject_ids.len(),
        "Normalized articles"
    );

    batch
}

//! The report run.
//!
//! Strictly sequential: load licenses, search and fetch, normalize, resolve
//! the three worklists, then format and write. Any error aborts the run
//! before the output file is created, except for a failure while writing
//! it.

use crate::config::ReportConfig;
use crate::entrez::{EntrezClient, SearchResult};
use crate::error::Result;
use crate::license::{license_item, LicenseTable};
use crate::normalize::{self, NormalizedBatch, Record, Worklists};
use crate::report::{self, ReportRow, ResolutionMaps};
use crate::wikidata::WikidataClient;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{info, warn};

/// Counters of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Total matches reported by the search
    pub matches: String,
    /// Ids the search returned within the result cap
    pub returned: usize,
    pub fetched: usize,
    pub accepted: usize,
    /// Rejected articles of every reason
    pub dropped: usize,
    pub rows: usize,
}

impl RunSummary {
    pub fn new(
        search: &SearchResult,
        fetched: usize,
        batch: &NormalizedBatch,
        rows: usize,
    ) -> Self {
        Self {
            matches: search.count.clone(),
            returned: search.ids.len(),
            fetched,
            accepted: batch.records.len(),
            dropped: batch.dropped.len(),
            rows,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search returned {} of {} matches.", self.returned, self.matches)?;
        write!(
            f,
            "We got information on {} records ({} dropped).",
            self.accepted, self.dropped
        )
    }
}

/// Run the whole report.
pub async fn run(config: &ReportConfig) -> Result<RunSummary> {
    config.validate()?;

    let (licenses, _) = LicenseTable::load(&config.license_file)?;

    let entrez = EntrezClient::new(
        &config.eutils_base,
        &config.api_key,
        &config.user_agent,
        config.timeout,
    )?;
    let search = entrez.search(&config.term, config.retmax).await?;
    let articles = entrez.fetch(&search, config.retmax).await?;

    let batch = normalize::normalize_all(&articles, &licenses);

    let wikidata =
        WikidataClient::new(&config.sparql_endpoint, &config.user_agent, config.timeout)?;
    let maps = resolve_identifiers(&wikidata, &batch.worklists).await?;

    let rows = build_rows(&batch.records, &maps);
    let written = report::write_report(&config.output, &rows)?;

    let summary = RunSummary::new(&search, articles.len(), &batch, written);
    info!(?summary, "Report complete");
    Ok(summary)
}

/// One batch lookup per worklist.
pub async fn resolve_identifiers(
    client: &WikidataClient,
    worklists: &Worklists,
) -> Result<ResolutionMaps> {
    let pmcids = client.resolve_pmcids(&worklists.pmcids).await?;
    let issns = client.resolve_issns(&worklists.issns).await?;
    let subjects = client.resolve_subjects(&worklists.subject_ids).await?;

    Ok(ResolutionMaps {
        pmcids,
        issns,
        drugs: subjects.drugs,
        diseases: subjects.diseases,
    })
}

/// Distinct license labels that have no known license item.
pub fn unknown_licenses(records: &[Record]) -> BTreeSet<&str> {
    records
        .iter()
        .map(|r| r.license.as_str())
        .filter(|label| license_item(label).is_none())
        .collect()
}

/// Format every record, in order. Unknown license labels are logged once.
pub fn build_rows(records: &[Record], maps: &ResolutionMaps) -> Vec<ReportRow> {
    for label in unknown_licenses(records) {
        warn!(license = label, "No license item known for label");
    }

    records.iter().map(|r| report::format_row(r, maps)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Subject;

    fn record(pmid: &str, license: &str) -> Record {
        Record {
            title: format!("Title {}", pmid),
            pmid: pmid.to_string(),
            pmcid: None,
            license: license.to_string(),
            subjects: vec![Subject {
                name: "Rett Syndrome".to_string(),
                id: "D015518".to_string(),
            }],
            publication_date: "Jan-2020".to_string(),
            publication: "Journal".to_string(),
            issn: String::new(),
            publication_type: "Review".to_string(),
        }
    }

    #[test]
    fn test_build_rows_keeps_order_and_count() {
        let records = vec![record("3", "CC BY"), record("1", "CC0"), record("2", "NO-CC CODE")];
        let rows = build_rows(&records, &ResolutionMaps::default());
        assert_eq!(rows.len(), records.len());
        let pmids: Vec<&str> = rows.iter().map(|r| r.fields()[2].as_str()).collect();
        assert_eq!(pmids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_unknown_licenses() {
        let records = vec![
            record("1", "CC BY"),
            record("2", "NO-CC CODE"),
            record("3", "NO-CC CODE"),
            record("4", "CC BY-SA"),
        ];
        let unknown: Vec<&str> = unknown_licenses(&records).into_iter().collect();
        assert_eq!(unknown, vec!["CC BY-SA", "NO-CC CODE"]);
    }

    #[test]
    fn test_run_summary_counts() {
        let search = SearchResult {
            count: "42".to_string(),
            ids: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            web_env: "MCID_1".to_string(),
            query_key: "1".to_string(),
        };
        let batch = NormalizedBatch {
            records: vec![record("1", "CC BY")],
            worklists: Worklists::default(),
            dropped: vec![
                ("2".to_string(), normalize::Rejection::Unlicensed),
                ("3".to_string(), normalize::Rejection::MissingArticleBody),
            ],
        };

        // Fetch may return fewer articles than the search listed
        let summary = RunSummary::new(&search, 2, &batch, 1);
        assert_eq!(summary.returned, 3);
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.dropped, 2);
        assert_eq!(
            summary.to_string(),
            "Search returned 3 of 42 matches.\nWe got information on 1 records (2 dropped)."
        );
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let result = run(&ReportConfig::default()).await;
        assert!(matches!(result, Err(crate::error::ReportError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_license_file() {
        let config = ReportConfig {
            api_key: "secret".to_string(),
            license_file: "/nonexistent/oa_file_list.txt".into(),
            ..Default::default()
        };
        let result = run(&config).await;
        assert!(matches!(result, Err(crate::error::ReportError::Io(_))));
    }

    #[tokio::test]
    async fn test_resolve_identifiers_empty_worklists() -> Result<()> {
        let client = WikidataClient::new(
            "http://127.0.0.1:9/sparql",
            "oareport-test",
            std::time::Duration::from_secs(1),
        )?;
        let maps = resolve_identifiers(&client, &Worklists::default()).await?;
        assert!(maps.pmcids.is_empty());
        assert!(maps.issns.is_empty());
        assert!(maps.drugs.is_empty());
        assert!(maps.diseases.is_empty());
        Ok(())
    }
}

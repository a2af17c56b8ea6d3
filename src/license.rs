//! Open-access license lookup.
//!
//! The NCBI OA file list maps each archived paper to a license label.
//! Its first line is the generation date; the rest are tab-separated:
//!
//! ```text
//! oa_package/87/30/PMC17774.tar.gz	Arthritis Res. 1999 Oct 14; 1(1):63-70	PMC17774	PMID:11056661	NO-CC CODE
//! ```
//!
//! Lines that do not split into exactly five fields are skipped, with the
//! reason kept in the [`LoadReport`].

use crate::error::Result;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Number of tab-separated fields in a well-formed line
const FIELD_COUNT: usize = 5;

/// Prefix PubMed Central puts in front of its ids
pub const PMC_PREFIX: &str = "PMC";

/// Known license labels and their Wikidata items
const LICENSE_ITEMS: [(&str, &str); 6] = [
    ("CC0", "Q6938433"),
    ("CC BY", "Q6905323"),
    ("CC BY-NC-ND", "Q6937225"),
    ("CC BY-NC", "Q6936496"),
    // Not in the NCBI OA list, but Europe PMC reports them
    ("CC BY 2.5", "Q18810333"),
    ("CC BY 4.0", "Q20007257"),
];

/// Wikidata item for a license label, if it is one of the known labels.
pub fn license_item(label: &str) -> Option<&'static str> {
    LICENSE_ITEMS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, item)| *item)
}

/// Why a license-file line registered nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Line split into this many fields instead of five
    FieldCount(usize),
}

/// Result of interpreting one license-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Registered {
        pmid: Option<String>,
        pmcid: Option<String>,
        license: String,
    },
    Skipped(SkipReason),
}

/// Interpret one line of the license file (terminator already removed).
pub fn parse_line(line: &str) -> LineOutcome {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() != FIELD_COUNT {
        return LineOutcome::Skipped(SkipReason::FieldCount(parts.len()));
    }

    let license = parts[4].trim_end_matches(['\n', '\r']).to_string();

    // Not every entry has a PMID; when present it reads "PMID:<id>"
    let id_parts: Vec<&str> = parts[3].split(':').collect();
    let pmid = (id_parts.len() == 2).then(|| id_parts[1].to_string());

    let pmcid = (!parts[2].is_empty()).then(|| parts[2].to_string());

    LineOutcome::Registered {
        pmid,
        pmcid,
        license,
    }
}

/// Counters from one load of the license file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub lines: usize,
    pub registered: usize,
    /// Skipped lines as (1-based line number, reason)
    pub skipped: Vec<(usize, SkipReason)>,
}

/// Identifier → license label map. Keys are bare PMIDs and prefixed
/// PMC ids ("PMC17774").
#[derive(Debug, Clone, Default)]
pub struct LicenseTable {
    entries: HashMap<String, String>,
}

impl LicenseTable {
    /// Load the license file, failing only if it cannot be opened or read.
    pub fn load(path: &Path) -> Result<(Self, LoadReport)> {
        let file = File::open(path)?;
        let table = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            entries = table.0.len(),
            skipped = table.1.skipped.len(),
            "Loaded license table"
        );
        Ok(table)
    }

    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<(Self, LoadReport)> {
        let mut table = Self::default();
        let mut report = LoadReport::default();
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            report.lines += 1;

            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            match parse_line(line) {
                LineOutcome::Registered {
                    pmid,
                    pmcid,
                    license,
                } => {
                    if let Some(pmid) = pmid {
                        table.insert(pmid, license.clone());
                        report.registered += 1;
                    }
                    if let Some(pmcid) = pmcid {
                        table.insert(pmcid, license);
                        report.registered += 1;
                    }
                }
                LineOutcome::Skipped(reason) => {
                    debug!(line = report.lines, ?reason, "Skipping license line");
                    report.skipped.push((report.lines, reason));
                }
            }
        }

        Ok((table, report))
    }

    pub fn insert(&mut self, id: String, license: String) {
        self.entries.insert(id, license);
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a license by PMID first, then by PMC id.
    ///
    /// `pmcid` is looked up exactly as given. Table keys carry the `PMC`
    /// prefix, so a prefix-stripped id only matches a bare key. Empty ids
    /// and empty labels never resolve.
    pub fn resolve(&self, pmid: &str, pmcid: Option<&str>) -> Option<&str> {
        let lookup = |id: &str| {
            if id.is_empty() {
                None
            } else {
                self.get(id).filter(|label| !label.is_empty())
            }
        };

        lookup(pmid).or_else(|| pmcid.and_then(lookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "2019-05-01 10:11:12\n\
        oa_package/87/30/PMC17774.tar.gz\tArthritis Res. 1999 Oct 14; 1(1):63-70\tPMC17774\tPMID:11056661\tNO-CC CODE\n\
        oa_package/a/b/PMC13900.tar.gz\tBreast Cancer Res. 2000\tPMC13900\t\tCC BY\n\
        oa_package/c/d/PMC55.tar.gz\tNo PMC\t\tPMID:4242\tCC BY-NC\n";

    fn table_from(text: &str) -> (LicenseTable, LoadReport) {
        LicenseTable::from_reader(Cursor::new(text.as_bytes().to_vec())).expect("Load failed")
    }

    #[test]
    fn test_scenario_line_registers_both_ids() {
        let (table, report) = table_from("p\tc\tPMC17774\tPMID:11056661\tCC BY\n");
        assert_eq!(table.get("11056661"), Some("CC BY"));
        assert_eq!(table.get("PMC17774"), Some("CC BY"));
        assert_eq!(report.registered, 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_malformed_lines_register_nothing() {
        let (table, report) = table_from("2019-05-01 10:11:12\na\tb\tPMC1\nq\tw\te\tr\tt\ty\n");
        assert!(table.is_empty());
        assert_eq!(report.lines, 3);
        assert_eq!(
            report.skipped,
            vec![
                (1, SkipReason::FieldCount(1)),
                (2, SkipReason::FieldCount(3)),
                (3, SkipReason::FieldCount(6)),
            ]
        );
    }

    #[test]
    fn test_optional_id_fields() {
        let (table, report) = table_from(SAMPLE);
        assert_eq!(table.get("11056661"), Some("NO-CC CODE"));
        assert_eq!(table.get("PMC13900"), Some("CC BY"));
        assert_eq!(table.get("4242"), Some("CC BY-NC"));
        assert_eq!(table.len(), 4);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_parse_line_outcomes() {
        assert_eq!(
            parse_line("a\tb\t\tPMID:7\tCC0\r\n"),
            LineOutcome::Registered {
                pmid: Some("7".to_string()),
                pmcid: None,
                license: "CC0".to_string(),
            }
        );
        // Id field without the two-part form registers only the PMC id
        assert_eq!(
            parse_line("a\tb\tPMC9\t7\tCC0"),
            LineOutcome::Registered {
                pmid: None,
                pmcid: Some("PMC9".to_string()),
                license: "CC0".to_string(),
            }
        );
        assert_eq!(parse_line(""), LineOutcome::Skipped(SkipReason::FieldCount(1)));
    }

    #[test]
    fn test_last_line_without_newline() {
        let (table, _) = table_from("a\tb\tPMC1\tPMID:1\tCC0");
        assert_eq!(table.get("1"), Some("CC0"));
    }

    #[test]
    fn test_resolve_order() {
        let mut table = LicenseTable::default();
        table.insert("100".to_string(), "CC BY".to_string());
        table.insert("200".to_string(), "CC0".to_string());

        assert_eq!(table.resolve("100", Some("200")), Some("CC BY"));
        assert_eq!(table.resolve("101", Some("200")), Some("CC0"));
        assert_eq!(table.resolve("101", Some("201")), None);
        assert_eq!(table.resolve("101", Some("")), None);
        assert_eq!(table.resolve("101", None), None);
        assert_eq!(table.resolve("", None), None);
    }

    #[test]
    fn test_pmcid_lookup_is_literal() {
        let mut table = LicenseTable::default();
        table.insert("PMC200".to_string(), "CC0".to_string());

        assert_eq!(table.resolve("101", Some("200")), None);
        assert_eq!(table.resolve("101", Some("PMC200")), Some("CC0"));
    }

    #[test]
    fn test_empty_label_does_not_resolve() {
        let mut table = LicenseTable::default();
        table.insert("100".to_string(), String::new());
        table.insert("200".to_string(), "CC BY-NC".to_string());
        assert_eq!(table.resolve("100", Some("200")), Some("CC BY-NC"));
        assert_eq!(table.resolve("100", None), None);
    }

    #[test]
    fn test_license_item() {
        assert_eq!(license_item("CC BY"), Some("Q6905323"));
        assert_eq!(license_item("CC BY 4.0"), Some("Q20007257"));
        assert_eq!(license_item("NO-CC CODE"), None);
        assert_eq!(license_item("cc by"), None);
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(SAMPLE.as_bytes())?;

        let (table, report) = LicenseTable::load(temp.path())?;
        assert_eq!(table.len(), 4);
        assert_eq!(report.lines, 4);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = LicenseTable::load(Path::new("/nonexistent/oa_file_list.txt"));
        assert!(matches!(result, Err(crate::error::ReportError::Io(_))));
    }
}

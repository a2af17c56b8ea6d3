//! Report row formatting and output.
//!
//! Joins each [`Record`] with the Wikidata lookups into one tab-separated
//! row. Fields are written raw, without quoting.

use crate::error::Result;
use crate::license::license_item;
use crate::mesh::Subject;
use crate::normalize::Record;
use crate::wikidata::ItemMap;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Output column order
pub const HEADER: [&str; 12] = [
    "Title",
    "Item",
    "PMID",
    "PMCID",
    "License",
    "License Item",
    "Main Subjects",
    "Publication Date",
    "Publication",
    "ISSN",
    "ISSN item",
    "Publication Type",
];

/// The batch lookup results a row is formatted against.
#[derive(Debug, Clone, Default)]
pub struct ResolutionMaps {
    pub pmcids: ItemMap,
    pub issns: ItemMap,
    pub drugs: ItemMap,
    pub diseases: ItemMap,
}

/// One formatted output row, in [`HEADER`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow(pub [String; 12]);

impl ReportRow {
    pub fn fields(&self) -> &[String; 12] {
        &self.0
    }

    /// Tab-joined, newline-terminated line
    pub fn to_line(&self) -> String {
        let mut line = self.0.join("\t");
        line.push('\n');
        line
    }
}

fn lookup(map: &ItemMap, key: &str) -> String {
    map.get(key).cloned().unwrap_or_default()
}

/// Render subjects as "Name (drug, disease); Name; ...".
pub fn subject_column(subjects: &[Subject], drugs: &ItemMap, diseases: &ItemMap) -> String {
    subjects
        .iter()
        .map(|subject| {
            let items: Vec<&str> = [drugs.get(&subject.id), diseases.get(&subject.id)]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .filter(|item| !item.is_empty())
                .collect();

            if items.is_empty() {
                subject.name.clone()
            } else {
                format!("{} ({})", subject.name, items.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Format a record into its output row.
pub fn format_row(record: &Record, maps: &ResolutionMaps) -> ReportRow {
    let pmcid = record.pmcid.clone().unwrap_or_default();

    ReportRow([
        record.title.clone(),
        lookup(&maps.pmcids, &pmcid),
        record.pmid.clone(),
        pmcid,
        record.license.clone(),
        license_item(&record.license).unwrap_or_default().to_string(),
        subject_column(&record.subjects, &maps.drugs, &maps.diseases),
        record.publication_date.clone(),
        record.publication.clone(),
        record.issn.clone(),
        lookup(&maps.issns, &record.issn),
        record.publication_type.clone(),
    ])
}

/// Tab-separated report file. The header is written on creation.
pub struct ReportWriter {
    writer: csv::Writer<File>,
    rows: usize,
}

impl ReportWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        self.writer.write_record(row.fields())?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and close, returning the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}

/// Write a full report: header plus one row per entry.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<usize> {
    let mut writer = ReportWriter::create(path)?;
    for row in rows {
        writer.write_row(row)?;
    }
    let written = writer.finish()?;
    info!(path = %path.display(), rows = written, "Saved report");
    Ok(written)
}

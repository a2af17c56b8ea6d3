//! # oareport
//!
//! Open-access license report for a PubMed literature search.
//!
//! Fetches the articles matching a query, keeps those listed in the NCBI
//! open-access file list, and writes one tab-separated row per article
//! with its license, major MeSH subjects and Wikidata cross-references.
//!
//! ## Modules
//!
//! - [`entrez`] - ESearch/EFetch client
//! - [`pubmed_xml`] - EFetch XML decoding
//! - [`license`] - OA file list loading and license lookup
//! - [`normalize`] - Article → record normalization and lookup worklists
//! - [`wikidata`] - Batch identifier resolution
//! - [`report`] - Row formatting and output
//! - [`pipeline`] - The end-to-end run
//!
//! ## Usage
//!
//! ```rust,no_run
//! use oareport::{config::ReportConfig, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReportConfig {
//!         api_key: std::env::var("NCBI_API_KEY")?,
//!         ..Default::default()
//!     };
//!     let summary = pipeline::run(&config).await?;
//!     println!("Wrote {} rows", summary.rows);
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod config;
pub mod entrez;
pub mod error;
pub mod license;
pub mod mesh;
pub mod normalize;
pub mod pipeline;
pub mod pubdate;
pub mod pubmed_xml;
pub mod report;
pub mod wikidata;

pub use error::{ReportError, Result};

//! oareport - PubMed open-access license report
//!
//! ## Usage
//!
//! ```bash
//! NCBI_API_KEY=... oareport report --licenses oa_file_list.txt --output results.csv
//! oareport licenses oa_file_list.txt
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oareport::config::{self, ReportConfig};
use oareport::license::{LicenseTable, SkipReason};
use oareport::pipeline;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// PubMed open-access license report with Wikidata cross-references
#[derive(Parser)]
#[command(name = "oareport")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search PubMed and write the license report
    Report {
        /// NCBI OA file list
        #[arg(long, default_value = config::DEFAULT_LICENSE_FILE)]
        licenses: PathBuf,

        /// Report destination (tab-separated)
        #[arg(short, long, default_value = config::DEFAULT_OUTPUT)]
        output: PathBuf,

        /// PubMed search term
        #[arg(long, default_value = config::DEFAULT_TERM)]
        term: String,

        /// Maximum number of articles to fetch
        #[arg(long, default_value_t = config::DEFAULT_RETMAX)]
        retmax: u32,

        /// NCBI API key
        #[arg(long, env = "NCBI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// E-utilities base URL
        #[arg(long)]
        eutils_base: Option<String>,

        /// Wikidata SPARQL endpoint
        #[arg(long)]
        sparql_endpoint: Option<String>,

        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Load an OA file list and summarize what it registers
    Licenses {
        /// NCBI OA file list
        #[arg(default_value = config::DEFAULT_LICENSE_FILE)]
        path: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Report {
            licenses,
            output,
            term,
            retmax,
            api_key,
            eutils_base,
            sparql_endpoint,
            timeout,
        } => {
            let defaults = ReportConfig::default();
            let config = ReportConfig {
                license_file: licenses,
                output,
                term,
                retmax,
                api_key,
                eutils_base: eutils_base.unwrap_or(defaults.eutils_base),
                sparql_endpoint: sparql_endpoint.unwrap_or(defaults.sparql_endpoint),
                timeout: timeout.map(Duration::from_secs).unwrap_or(defaults.timeout),
                user_agent: defaults.user_agent,
            };
            run_report(config).await
        }
        Commands::Licenses { path } => show_licenses(path),
    }
}

async fn run_report(config: ReportConfig) -> Result<()> {
    let summary = pipeline::run(&config)
        .await
        .context("Report run failed")?;

    println!("{}", summary);
    println!("Saved {} rows to {}", summary.rows, config.output.display());
    Ok(())
}

fn show_licenses(path: PathBuf) -> Result<()> {
    let (table, report) = LicenseTable::load(&path)
        .with_context(|| format!("Failed to load license file {}", path.display()))?;

    println!("License file: {}", path.display());
    println!("  Lines:      {}", report.lines);
    println!("  Registered: {}", report.registered);
    println!("  Distinct ids: {}", table.len());
    println!("  Skipped:    {}", report.skipped.len());

    let mut by_reason: BTreeMap<usize, usize> = BTreeMap::new();
    for (_, reason) in &report.skipped {
        let SkipReason::FieldCount(n) = reason;
        *by_reason.entry(*n).or_default() += 1;
    }
    for (fields, count) in by_reason {
        println!("    {} line(s) with {} field(s)", count, fields);
    }

    Ok(())
}

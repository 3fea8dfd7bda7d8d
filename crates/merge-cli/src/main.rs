//! Inspect Merge CLI - merge stage of the inspection diagnostics pipeline
//!
//! Takes the three extracted documents (areas, systems, thermal readings),
//! validates them, runs the merge-and-inference core, and writes the final
//! diagnostic record as indented JSON.

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use inspection_common::{AreasDocument, SystemsDocument, ThermalDocument};
use inspection_fusion::{merge_documents, DiagnosticRecord};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "inspect-merge",
    version,
    about = "Merge extracted inspection documents into a diagnostic record",
    long_about = "Cross-references thermal anomalies against inspected areas, infers root\n\
                  causes from system-level findings, scores overall severity, and reports\n\
                  fields the upstream extraction left unresolved.\n\n\
                  All three inputs must conform to their extraction schemas; any schema or\n\
                  consistency violation aborts the run before the output file is written."
)]
struct Cli {
    /// Areas document produced by the area extraction stage
    areas: PathBuf,

    /// Systems document produced by the system extraction stage
    systems: PathBuf,

    /// Thermal readings document produced by the thermal extraction stage
    thermal: PathBuf,

    /// Destination for the merged diagnostic record (overwritten)
    output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Load and schema-check one input document.
fn load_document<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    if !path.exists() {
        bail!("Missing input file: {}", path.display());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {kind} document {}", path.display()))?;

    serde_json::from_str(&text)
        .with_context(|| format!("Schema violation in {kind} document {}", path.display()))
}

/// Serialize the diagnostic record as 2-space-indented JSON, fully
/// overwriting any previous output. Only called after the merge succeeded,
/// so a failed run never leaves a partial file behind.
fn write_diagnostic(record: &DiagnosticRecord, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(record).context("Failed to serialize diagnostic record")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    tracing::info!("Loading input documents");
    let areas: AreasDocument = load_document(&cli.areas, "areas")?;
    let systems: SystemsDocument = load_document(&cli.systems, "systems")?;
    let thermal: ThermalDocument = load_document(&cli.thermal, "thermal")?;

    areas
        .validate()
        .context("Areas document failed validation")?;
    thermal
        .validate()
        .context("Thermal document failed validation")?;

    let record = merge_documents(areas, systems, &thermal)?;

    write_diagnostic(&record, &cli.output)?;

    let causes = if record.overall.primary_root_causes.is_empty() {
        "none".to_string()
    } else {
        record.overall.primary_root_causes.join("; ")
    };
    println!("Areas analyzed: {}", record.areas.len());
    println!("Root causes:    {causes}");
    println!("Severity:       {}", record.overall.severity);
    println!(
        "Missing fields: {}",
        record.overall.missing_information.len()
    );
    println!("Diagnostic written to {}", cli.output.display());

    Ok(())
}

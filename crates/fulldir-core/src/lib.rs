//! Rebuilds an NTFS directory hierarchy from a full-dir dump and renders it
//! as an indented report.
//!
//! A full-dir dump is a flat stream of length-prefixed records, one per MFT
//! entry, sorted by record id. [`tree::DirectoryTree`] links every record
//! under its parent and [`report`] walks the result from the root directory.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

pub mod config;
pub mod error;
pub mod filetime;
pub mod record;
pub mod report;
pub mod sample;
pub mod source;
pub mod tree;

pub use config::{ParseConfig, ReportFormat, NTFS_ROOT_RECORD};
pub use error::ParseError;
pub use record::{AttributeFlags, DirectoryEntry, RawRecord, RecordReader};
pub use source::DumpSource;
pub use tree::{DirectoryTree, LinkStats, SystemRecord};

/// Load a dump file and reconstruct its directory tree
pub fn parse_dump(dump_path: &Path, config: &ParseConfig) -> Result<DirectoryTree> {
    tracing::info!("Parsing dump: {}", dump_path.display());

    let source = DumpSource::open(dump_path)
        .with_context(|| format!("failed to open dump {}", dump_path.display()))?;
    tracing::debug!("Mapped {} bytes from {}", source.size(), source.path().display());

    let tree = DirectoryTree::load(source.reader(), config)
        .with_context(|| format!("failed to parse dump {}", dump_path.display()))?;

    Ok(tree)
}

/// Write the report for `tree` to `output_path`
pub fn dump_dir(
    tree: &DirectoryTree,
    output_path: &Path,
    config: &ParseConfig,
    format: ReportFormat,
) -> Result<usize> {
    report::render_to_file(tree, output_path, config, format)
        .with_context(|| format!("failed to write report {}", output_path.display()))
}

/// Outcome of a full parse-and-render run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: LinkStats,
    pub entries_written: usize,
    pub elapsed: std::time::Duration,
}

/// Parse `dump_path` and render the report to `output_path`
pub fn run(
    dump_path: &Path,
    output_path: &Path,
    config: &ParseConfig,
    format: ReportFormat,
) -> Result<RunSummary> {
    let start = Instant::now();
    let tree = parse_dump(dump_path, config)?;
    let entries_written = dump_dir(&tree, output_path, config, format)?;

    let summary = RunSummary {
        stats: tree.stats().clone(),
        entries_written,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        "Finished: {} of {} entries written ({:.3}s)",
        summary.entries_written,
        summary.stats.total_entries,
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}

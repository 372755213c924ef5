use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser};
use fulldir_core::config::DEFAULT_DATE_FORMAT;
use fulldir_core::filetime::validate_date_format;
use fulldir_core::{
	run, sample::write_sample_dump, ParseConfig, ParseError, ReportFormat, NTFS_ROOT_RECORD,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
	name = "fulldir",
	version,
	about = "Rebuild an NTFS directory tree from a full-dir dump"
)]
struct Cli {
	/// Full-dir dump file produced by the extraction tool
	input: Option<PathBuf>,
	/// Report file to write
	output: Option<PathBuf>,
	/// Report format
	#[arg(long, value_parser = ["text", "json"], default_value = "text")]
	format: String,
	/// Record id of the root directory
	#[arg(long, default_value_t = NTFS_ROOT_RECORD)]
	root_id: u64,
	/// Skip the record ordering check
	#[arg(long)]
	no_verify_order: bool,
	/// chrono format string for modified times
	#[arg(long, default_value = DEFAULT_DATE_FORMAT, value_parser = parse_date_format)]
	date_format: String,
	/// Write a small synthetic dump to PATH and exit
	#[arg(long, value_name = "PATH")]
	write_sample: Option<PathBuf>,
	/// Debug logging
	#[arg(short, long)]
	verbose: bool,
}

fn parse_date_format(value: &str) -> std::result::Result<String, String> {
	validate_date_format(value)
		.map(|()| value.to_string())
		.map_err(|e| e.to_string())
}

impl Cli {
	fn parse_config(&self) -> ParseConfig {
		ParseConfig::default()
			.with_root_id(self.root_id)
			.with_verify_order(!self.no_verify_order)
			.with_date_format(self.date_format.clone())
	}

	fn report_format(&self) -> ReportFormat {
		self.format.parse().unwrap_or_default()
	}
}

fn init_tracing(verbose: bool) {
	let default_level = if verbose { "debug" } else { "info" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn parse_and_dump(cli: &Cli, input: &Path, output: &Path) -> Result<()> {
	let config = cli.parse_config();
	let format = cli.report_format();

	println!("🔍 Parsing dump: {}", input.display());
	let summary = run(input, output, &config, format)?;

	println!("✅ Report written to {}", output.display());
	println!("📁 Records loaded: {}", summary.stats.total_entries);
	println!("🌳 Entries in tree: {}", summary.entries_written);
	println!(
		"👻 Orphans skipped: {} ({} metadata records)",
		summary.stats.orphans, summary.stats.system_orphans
	);
	println!("⏱️  Finished in {:.3} seconds", summary.elapsed.as_secs_f64());
	Ok(())
}

/// Exit status: 2 when the dump itself is bad, 1 for everything else
fn exit_code(err: &anyhow::Error) -> i32 {
	match err.downcast_ref::<ParseError>() {
		Some(parse_err) if parse_err.is_input_error() => 2,
		_ => 1,
	}
}

fn execute(cli: &Cli) -> Result<()> {
	if let Some(path) = &cli.write_sample {
		let count = write_sample_dump(path)?;
		println!("✅ Wrote {} sample records to {}", count, path.display());
		return Ok(());
	}

	match (&cli.input, &cli.output) {
		(Some(input), Some(output)) => parse_and_dump(cli, input, output),
		_ => {
			Cli::command().print_help()?;
			println!();
			Ok(())
		}
	}
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	if let Err(e) = execute(&cli) {
		eprintln!("❌ {:#}", e);
		std::process::exit(exit_code(&e));
	}
}

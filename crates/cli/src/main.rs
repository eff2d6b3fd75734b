use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use dts_flows::{FlowError, PipelineError};
use tracing_subscriber::EnvFilter;

mod commands;

/// Treasury cash flows through the TGA, as Sankey-ready JSON.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// TOML config file; flags below override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Folder searched for the input CSVs.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Deposits/withdrawals CSV, skipping discovery.
    #[arg(long, global = true)]
    pub transactions: Option<PathBuf>,
    /// Category mapping CSV, skipping discovery.
    #[arg(long, global = true)]
    pub mapping: Option<PathBuf>,
    #[command(flatten)]
    pub range: RangeArgs,
    /// Drop rows whose category has no mapping.
    #[arg(long, global = true)]
    pub exclude_unmapped: bool,
    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// First day included (YYYY-MM-DD). Defaults to a year before the latest record.
    #[arg(long, global = true)]
    pub start: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD). Defaults to the latest record.
    #[arg(long, global = true)]
    pub end: Option<NaiveDate>,
    /// Whole calendar year; overrides --start/--end.
    #[arg(long, global = true)]
    pub year: Option<i32>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Date bounds, years and cabinets available in the data.
    Info,
    /// Cabinet-level gross flows through the TGA.
    Flows,
    /// Deposits, withdrawals and net per cabinet.
    Net,
    /// Cabinet → agency → program flows for one cabinet.
    Drilldown {
        /// Cabinet to open; defaults to the largest for the transaction type.
        #[arg(long)]
        cabinet: Option<String>,
        /// Deposits or Withdrawals.
        #[arg(long = "type", default_value = "Withdrawals")]
        transaction_type: dts_core::TransactionType,
        /// Programs kept per agency before the rest are grouped as Other.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Categories missing from the mapping file, largest first.
    Unmapped {
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match empty_state(&e) {
            Some(msg) => {
                eprintln!("Nothing to show: {msg}");
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

/// An empty selection is a normal outcome, not a failure.
fn empty_state(err: &anyhow::Error) -> Option<&str> {
    let flow = match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::Flow(flow)) => flow,
        _ => err.downcast_ref::<FlowError>()?,
    };
    match flow {
        FlowError::EmptyGraph(msg) => Some(msg),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let output = commands::execute(cli)?;
    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use dts_core::{DateRange, TransactionType};
use dts_flows::{
    cabinet_options, clamp_top_n, default_cabinet, drilldown, flows_report, net_by_cabinet, summarize,
    unmapped_report, EnrichedCache, EnrichedTable, FlowError, FlowTotals, Pipeline, PipelineConfig, RangeRequest,
    Selection,
};

use crate::{Cli, Command};

/// What `info` reports about the loaded data.
#[derive(Debug, Serialize)]
struct DataInfo {
    transactions: String,
    mapping: String,
    rows: usize,
    unmapped_rows: usize,
    bounds: Option<DateRange>,
    default_range: Option<DateRange>,
    years: Vec<i32>,
    cabinets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NetReport {
    range: DateRange,
    cabinets: Vec<FlowTotals>,
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(path) = &cli.transactions {
        config.transactions_path = Some(path.clone());
    }
    if let Some(path) = &cli.mapping {
        config.mapping_path = Some(path.clone());
    }
    if cli.exclude_unmapped {
        config.include_unmapped = false;
    }
    tracing::debug!(?config, "Resolved configuration");
    Ok(config)
}

fn selection(cli: &Cli, config: &PipelineConfig, table: &EnrichedTable) -> Result<Selection> {
    let request = RangeRequest {
        start: cli.range.start,
        end: cli.range.end,
        year: cli.range.year,
    };
    let range = request
        .resolve(table)
        .context("Invalid date range")?
        .ok_or_else(|| FlowError::EmptyGraph("the transactions file has no dated rows".into()))?;
    Ok(Selection::new(range, config.include_unmapped))
}

pub fn execute(cli: &Cli) -> Result<Value> {
    run_with(cli, Pipeline::new(load_config(cli)?))
}

fn run_with(cli: &Cli, pipeline: Pipeline) -> Result<Value> {
    let table = pipeline.enriched()?;
    let config = pipeline.config();

    let value = match &cli.command {
        Command::Info => {
            let sources = pipeline.sources()?;
            let default_range = table.default_range();
            let cabinets = match default_range {
                Some(range) => cabinet_options(table.records(), &Selection::new(range, config.include_unmapped)),
                None => Vec::new(),
            };
            serde_json::to_value(DataInfo {
                transactions: sources.transactions.display().to_string(),
                mapping: sources.mapping.display().to_string(),
                rows: table.len(),
                unmapped_rows: table.unmapped_count(),
                bounds: table.date_bounds(),
                default_range,
                years: table.years(),
                cabinets,
            })?
        }
        Command::Flows => {
            let selection = selection(cli, config, &table)?;
            serde_json::to_value(flows_report(&table, &selection)?)?
        }
        Command::Net => {
            let selection = selection(cli, config, &table)?;
            if summarize(table.records(), &selection).rows == 0 {
                return Err(FlowError::EmptyGraph(format!("no transactions between {}", selection.range)).into());
            }
            serde_json::to_value(NetReport {
                range: selection.range,
                cabinets: net_by_cabinet(table.records(), &selection),
            })?
        }
        Command::Drilldown {
            cabinet,
            transaction_type,
            top,
        } => {
            let selection = selection(cli, config, &table)?;
            let cabinet = default_cabinet(&table, &selection, transaction_type, cabinet.as_deref())
                .ok_or_else(|| no_cabinet(transaction_type, &selection))?;
            let top_n = top.map(clamp_top_n).unwrap_or_else(|| config.effective_top_n());
            serde_json::to_value(drilldown(&table, &selection, &cabinet, transaction_type, top_n)?)?
        }
        Command::Unmapped { limit } => {
            let selection = selection(cli, config, &table)?;
            let limit = limit.unwrap_or(config.unmapped_limit);
            serde_json::to_value(unmapped_report(table.records(), selection.range, limit))?
        }
    };
    Ok(value)
}

fn no_cabinet(transaction_type: &TransactionType, selection: &Selection) -> FlowError {
    FlowError::EmptyGraph(format!("no {transaction_type} between {}", selection.range))
}

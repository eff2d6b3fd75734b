use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use dts_core::{DateRange, PeriodError};
use dts_import::{
    load_category_map, load_transactions, FileLocator, LoadError, LocateError, TransactionLoadOptions,
};

use crate::aggregate::{net_by_cabinet, summarize, FlowTotals, Selection, Summary};
use crate::cache::EnrichedCache;
use crate::config::PipelineConfig;
use crate::enrich::{enrich, EnrichedTable};
use crate::graph::{cabinet_flow, FlowError, FlowGraph};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Failed to fingerprint source file: {0}")]
    Fingerprint(#[from] std::io::Error),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Period(#[from] PeriodError),
}

/// The two resolved input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub transactions: PathBuf,
    pub mapping: PathBuf,
}

impl Sources {
    /// Explicit paths from the config win; anything else is discovered in `data_dir`.
    pub fn resolve(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let locator = FileLocator::new(&config.data_dir);
        let transactions = match &config.transactions_path {
            Some(path) => path.clone(),
            None => locator.find_first("deposits/withdrawals", &config.transactions_candidates)?,
        };
        let mapping = match &config.mapping_path {
            Some(path) => path.clone(),
            None => locator.find_first("category mapping", &config.mapping_candidates)?,
        };
        tracing::info!(
            "Sources: transactions={} mapping={}",
            transactions.display(),
            mapping.display()
        );
        Ok(Self { transactions, mapping })
    }
}

/// How the caller narrowed the date window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
    /// Whole calendar year; overrides `start`/`end`.
    pub year: Option<i32>,
}

impl RangeRequest {
    /// Resolves against the data: missing ends fall back to the default
    /// trailing-year window.
    pub fn resolve(self, table: &EnrichedTable) -> Result<Option<DateRange>, PeriodError> {
        if let Some(year) = self.year {
            return DateRange::calendar_year(year).map(Some);
        }
        let Some(default) = table.default_range() else {
            return Ok(None);
        };
        let start = self.start.unwrap_or(default.start);
        let end = self.end.unwrap_or(default.end);
        DateRange::checked(start, end).map(Some)
    }
}

/// Gross-flow view: headline totals, the two-level graph and the cabinet table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FlowsReport {
    pub range: DateRange,
    pub summary: Summary,
    pub graph: FlowGraph,
    /// Ordered by withdrawals, largest first.
    pub cabinets: Vec<FlowTotals>,
}

pub fn flows_report(table: &EnrichedTable, selection: &Selection) -> Result<FlowsReport, FlowError> {
    let cabinets = net_by_cabinet(table.records(), selection);
    let mut by_name = cabinets.clone();
    by_name.sort_by(|a, b| a.key.cmp(&b.key));
    let graph = cabinet_flow(&by_name)?;
    Ok(FlowsReport {
        range: selection.range,
        summary: summarize(table.records(), selection),
        graph,
        cabinets,
    })
}

/// Loads, enriches and caches the two source tables.
pub struct Pipeline {
    config: PipelineConfig,
    cache: Arc<EnrichedCache>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_cache(config, EnrichedCache::global())
    }

    pub fn with_cache(config: PipelineConfig, cache: Arc<EnrichedCache>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sources(&self) -> Result<Sources, PipelineError> {
        Sources::resolve(&self.config)
    }

    /// The enriched table, from cache when neither source file has changed.
    pub fn enriched(&self) -> Result<Arc<EnrichedTable>, PipelineError> {
        let sources = self.sources()?;
        self.cache
            .get_or_load(&sources.transactions, &sources.mapping, || {
                load_enriched(&sources, &self.config)
            })
    }
}

/// Loads both files and joins them, bypassing any cache.
pub fn load_enriched(sources: &Sources, config: &PipelineConfig) -> Result<EnrichedTable, PipelineError> {
    let options = TransactionLoadOptions {
        tga_total_labels: config.tga_total_labels.clone(),
    };
    let transactions = load_transactions(&sources.transactions, &options)?;
    let mapping = load_category_map(&sources.mapping)?;
    Ok(enrich(&transactions.records, &mapping))
}

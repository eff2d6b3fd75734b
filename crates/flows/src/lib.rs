pub mod aggregate;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod drilldown;
pub mod enrich;
pub mod graph;
pub mod pipeline;
pub mod rank;

pub use aggregate::{
    aggregate, cabinet_options, default_cabinet, net_by_cabinet, sum_amounts, sum_flows, summarize,
    FlowTotals, GroupSum, Level, Selection, Summary,
};
pub use cache::EnrichedCache;
pub use config::{clamp_top_n, ConfigError, PipelineConfig};
pub use diagnostics::{unmapped_report, UnmappedCategory, UnmappedReport};
pub use drilldown::{drilldown, Drilldown};
pub use enrich::{enrich, EnrichedTable};
pub use graph::{cabinet_flow, drilldown_graph, AgencyTotal, FlowError, FlowGraph, TGA_NODE};
pub use pipeline::{flows_report, load_enriched, FlowsReport, Pipeline, PipelineError, RangeRequest, Sources};
pub use rank::{rank_and_bucket, ChildSum, OTHER_LABEL};

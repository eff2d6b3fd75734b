use dts_core::{Amount, TransactionType};
use serde::Serialize;

use crate::aggregate::{sum_amounts, Level, Selection};
use crate::enrich::EnrichedTable;
use crate::graph::{drilldown_graph, AgencyTotal, FlowError, FlowGraph};
use crate::rank::{rank_and_bucket, ChildSum};

/// Rows shown in the unbucketed top-programs table.
pub const TOP_PROGRAMS_LIMIT: usize = 100;

/// Cabinet → agency → program view for one cabinet and transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drilldown {
    pub cabinet: String,
    pub transaction_type: TransactionType,
    pub total: Amount,
    pub graph: FlowGraph,
    /// Largest first.
    pub agencies: Vec<AgencyTotal>,
    /// Unbucketed, largest first.
    pub top_programs: Vec<ChildSum>,
    /// Rows whose agency or program has no mapping.
    pub unmapped_rows: usize,
}

pub fn drilldown(
    table: &EnrichedTable,
    selection: &Selection,
    cabinet: &str,
    transaction_type: &TransactionType,
    top_n: usize,
) -> Result<Drilldown, FlowError> {
    let rows: Vec<_> = selection
        .filter(table.records(), &[Level::Cabinet])
        .filter(|r| r.cabinet() == cabinet && r.transaction_type() == transaction_type)
        .collect();

    if rows.is_empty() {
        return Err(FlowError::EmptyGraph(format!(
            "no {transaction_type} rows for cabinet '{cabinet}' in {}",
            selection.range
        )));
    }

    let total: Amount = rows.iter().map(|r| r.amount()).sum();

    let mut agencies: Vec<AgencyTotal> =
        sum_amounts(rows.iter().copied(), transaction_type, &[Level::Agency])
            .into_iter()
            .map(|s| AgencyTotal {
                agency: s.key.into_iter().next().unwrap_or_default(),
                total: s.amount,
            })
            .collect();
    agencies.sort_by(|a, b| b.total.cmp(&a.total));

    let programs: Vec<ChildSum> =
        sum_amounts(rows.iter().copied(), transaction_type, &[Level::Agency, Level::Program])
            .into_iter()
            .map(|s| {
                let mut key = s.key.into_iter();
                let agency = key.next().unwrap_or_default();
                let program = key.next().unwrap_or_default();
                ChildSum::new(agency, program, s.amount)
            })
            .collect();

    let bucketed = rank_and_bucket(&programs, top_n);
    let graph = drilldown_graph(cabinet, &agencies, &bucketed)?;

    let mut top_programs = programs;
    top_programs.sort_by(|a, b| b.amount.cmp(&a.amount));
    top_programs.truncate(TOP_PROGRAMS_LIMIT);

    let unmapped_rows = rows
        .iter()
        .filter(|r| r.agency() == dts_core::UNMAPPED || r.program() == dts_core::UNMAPPED)
        .count();
    if unmapped_rows > 0 {
        tracing::warn!(
            "Cabinet '{cabinet}' has {unmapped_rows} rows with unmapped agency/program in {}",
            selection.range
        );
    }

    Ok(Drilldown {
        cabinet: cabinet.to_string(),
        transaction_type: transaction_type.clone(),
        total,
        graph,
        agencies,
        top_programs,
        unmapped_rows,
    })
}

use dts_core::Amount;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::aggregate::FlowTotals;
use crate::rank::ChildSum;

pub const TGA_NODE: &str = "Treasury General Account (TGA)";
const DEPOSITS_PREFIX: &str = "Deposits: ";
const WITHDRAWALS_PREFIX: &str = "Withdrawals: ";
const AGENCY_PREFIX: &str = "Agency: ";
const PROGRAM_PREFIX: &str = "Program: ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("No data for this selection: {0}")]
    EmptyGraph(String),
}

/// Node labels plus parallel edge arrays; indices point into `nodes`.
///
/// This is everything a Sankey renderer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<String>,
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    pub values: Vec<Amount>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl FlowGraph {
    /// Index of `label`, appending it if it is new.
    fn node(&mut self, label: String) -> usize {
        if let Some(&i) = self.index.get(&label) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(label.clone(), i);
        self.nodes.push(label);
        i
    }

    fn link(&mut self, source: usize, target: usize, value: Amount) {
        self.sources.push(source);
        self.targets.push(target);
        self.values.push(value);
    }

    pub fn link_count(&self) -> usize {
        self.values.len()
    }

    /// `(source label, target label, value)` for each edge.
    pub fn links(&self) -> impl Iterator<Item = (&str, &str, Amount)> + '_ {
        self.sources
            .iter()
            .zip(&self.targets)
            .zip(&self.values)
            .map(|((&s, &t), &v)| (self.nodes[s].as_str(), self.nodes[t].as_str(), v))
    }
}

pub fn deposit_node(cabinet: &str) -> String {
    format!("{DEPOSITS_PREFIX}{cabinet}")
}

pub fn withdrawal_node(cabinet: &str) -> String {
    format!("{WITHDRAWALS_PREFIX}{cabinet}")
}

pub fn agency_node(agency: &str) -> String {
    format!("{AGENCY_PREFIX}{agency}")
}

/// Programs repeat across agencies, so the agency is part of the label.
pub fn program_node(agency: &str, program: &str) -> String {
    format!("{PROGRAM_PREFIX}{agency} → {program}")
}

/// Deposits by cabinet → TGA → withdrawals by cabinet.
///
/// Node order is every deposit cabinet, then the TGA, then every withdrawal
/// cabinet. A cabinet appears on a side only when its total there is positive.
pub fn cabinet_flow(cabinets: &[FlowTotals]) -> Result<FlowGraph, FlowError> {
    let cabinet = |t: &FlowTotals| t.key.first().cloned().unwrap_or_default();
    let deposits: Vec<(String, Amount)> = cabinets
        .iter()
        .filter(|t| t.deposits.is_positive())
        .map(|t| (cabinet(t), t.deposits))
        .collect();
    let withdrawals: Vec<(String, Amount)> = cabinets
        .iter()
        .filter(|t| t.withdrawals.is_positive())
        .map(|t| (cabinet(t), t.withdrawals))
        .collect();

    if deposits.is_empty() && withdrawals.is_empty() {
        return Err(FlowError::EmptyGraph(
            "no deposits or withdrawals in the selected range".to_string(),
        ));
    }

    let mut graph = FlowGraph::default();
    let deposit_ids: Vec<usize> = deposits.iter().map(|(c, _)| graph.node(deposit_node(c))).collect();
    let tga = graph.node(TGA_NODE.to_string());
    let withdrawal_ids: Vec<usize> = withdrawals
        .iter()
        .map(|(c, _)| graph.node(withdrawal_node(c)))
        .collect();

    for (id, (_, amount)) in deposit_ids.into_iter().zip(&deposits) {
        graph.link(id, tga, *amount);
    }
    for (id, (_, amount)) in withdrawal_ids.into_iter().zip(&withdrawals) {
        graph.link(tga, id, *amount);
    }

    Ok(graph)
}

/// An agency's total within the drilled-down cabinet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgencyTotal {
    pub agency: String,
    pub total: Amount,
}

/// Cabinet → agencies → (bucketed) programs.
///
/// `agencies` should already be ordered largest first; `programs` is the
/// output of [`crate::rank::rank_and_bucket`].
pub fn drilldown_graph(
    cabinet: &str,
    agencies: &[AgencyTotal],
    programs: &[ChildSum],
) -> Result<FlowGraph, FlowError> {
    if agencies.is_empty() {
        return Err(FlowError::EmptyGraph(format!(
            "no rows for cabinet '{cabinet}' in the selected range"
        )));
    }

    let mut graph = FlowGraph::default();
    let root = graph.node(cabinet.to_string());
    let agency_ids: Vec<usize> = agencies.iter().map(|a| graph.node(agency_node(&a.agency))).collect();
    let program_ids: Vec<usize> = programs
        .iter()
        .map(|p| graph.node(program_node(&p.parent, &p.child)))
        .collect();

    for (id, a) in agency_ids.into_iter().zip(agencies) {
        graph.link(root, id, a.total);
    }
    for (id, p) in program_ids.into_iter().zip(programs) {
        let parent = graph.node(agency_node(&p.parent));
        graph.link(parent, id, p.amount);
    }

    Ok(graph)
}

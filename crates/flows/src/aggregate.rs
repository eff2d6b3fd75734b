use dts_core::{Amount, DateRange, EnrichedRecord, TransactionType, UNMAPPED};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::enrich::EnrichedTable;

/// A column an aggregate can be grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Cabinet,
    Agency,
    Program,
    Category,
    CategoryDesc,
}

impl Level {
    pub fn value(self, record: &EnrichedRecord) -> &str {
        match self {
            Level::Cabinet => record.cabinet(),
            Level::Agency => record.agency(),
            Level::Program => record.program(),
            Level::Category => &record.transaction.key.transaction_catg,
            Level::CategoryDesc => &record.transaction.key.transaction_catg_desc,
        }
    }

    pub fn is_rollup(self) -> bool {
        matches!(self, Level::Cabinet | Level::Agency | Level::Program)
    }
}

/// Explicit filter parameters for every aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub range: DateRange,
    pub include_unmapped: bool,
}

impl Selection {
    pub fn new(range: DateRange, include_unmapped: bool) -> Self {
        Self { range, include_unmapped }
    }

    /// Rows inside the range, minus unmapped rows when those are excluded.
    ///
    /// "Unmapped" is judged on the rollup levels in `group_by`, falling back to
    /// the cabinet when the grouping has none.
    pub fn filter<'a>(
        &self,
        records: &'a [EnrichedRecord],
        group_by: &[Level],
    ) -> impl Iterator<Item = &'a EnrichedRecord> {
        let mut checked: Vec<Level> = group_by.iter().copied().filter(|l| l.is_rollup()).collect();
        if checked.is_empty() {
            checked.push(Level::Cabinet);
        }
        let range = self.range;
        let include_unmapped = self.include_unmapped;
        records.iter().filter(move |r| {
            range.contains(r.record_date())
                && (include_unmapped || checked.iter().all(|l| l.value(r) != UNMAPPED))
        })
    }
}

/// Deposits and withdrawals for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowTotals {
    pub key: Vec<String>,
    pub deposits: Amount,
    pub withdrawals: Amount,
    pub net: Amount,
}

impl FlowTotals {
    fn new(key: Vec<String>) -> Self {
        Self {
            key,
            deposits: Amount::zero(),
            withdrawals: Amount::zero(),
            net: Amount::zero(),
        }
    }

    /// The group key joined for display.
    pub fn label(&self) -> String {
        self.key.join(" / ")
    }
}

/// One group's total for a single transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSum {
    pub key: Vec<String>,
    pub amount: Amount,
}

fn group_key(record: &EnrichedRecord, group_by: &[Level]) -> Vec<String> {
    group_by.iter().map(|l| l.value(record).to_string()).collect()
}

/// Sums deposits and withdrawals per group, ascending by key.
///
/// A group seen on only one side still appears, with zero on the other.
/// Rows of any other transaction type are ignored.
pub fn sum_flows<'a>(
    rows: impl IntoIterator<Item = &'a EnrichedRecord>,
    group_by: &[Level],
) -> Vec<FlowTotals> {
    let mut groups: BTreeMap<Vec<String>, FlowTotals> = BTreeMap::new();
    for r in rows {
        let side = match r.transaction_type() {
            TransactionType::Deposits => true,
            TransactionType::Withdrawals => false,
            TransactionType::Other(_) => continue,
        };
        let key = group_key(r, group_by);
        let totals = groups
            .entry(key.clone())
            .or_insert_with(|| FlowTotals::new(key));
        if side {
            totals.deposits += r.amount();
        } else {
            totals.withdrawals += r.amount();
        }
    }

    groups
        .into_values()
        .map(|mut t| {
            t.net = t.deposits - t.withdrawals;
            t
        })
        .collect()
}

/// Sums a single transaction type per group, ascending by key.
pub fn sum_amounts<'a>(
    rows: impl IntoIterator<Item = &'a EnrichedRecord>,
    transaction_type: &TransactionType,
    group_by: &[Level],
) -> Vec<GroupSum> {
    let mut groups: BTreeMap<Vec<String>, Amount> = BTreeMap::new();
    for r in rows.into_iter().filter(|r| r.transaction_type() == transaction_type) {
        *groups.entry(group_key(r, group_by)).or_default() += r.amount();
    }
    groups
        .into_iter()
        .map(|(key, amount)| GroupSum { key, amount })
        .collect()
}

/// Filters by `selection`, then [`sum_flows`].
pub fn aggregate(records: &[EnrichedRecord], selection: &Selection, group_by: &[Level]) -> Vec<FlowTotals> {
    sum_flows(selection.filter(records, group_by), group_by)
}

/// Headline totals for a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub deposits: Amount,
    pub withdrawals: Amount,
    pub net: Amount,
    pub rows: usize,
}

pub fn summarize(records: &[EnrichedRecord], selection: &Selection) -> Summary {
    let mut summary = Summary {
        deposits: Amount::zero(),
        withdrawals: Amount::zero(),
        net: Amount::zero(),
        rows: 0,
    };
    for r in selection.filter(records, &[Level::Cabinet]) {
        summary.rows += 1;
        match r.transaction_type() {
            TransactionType::Deposits => summary.deposits += r.amount(),
            TransactionType::Withdrawals => summary.withdrawals += r.amount(),
            TransactionType::Other(_) => {}
        }
    }
    summary.net = summary.deposits - summary.withdrawals;
    summary
}

/// Cabinet totals ordered by withdrawals, largest first.
pub fn net_by_cabinet(records: &[EnrichedRecord], selection: &Selection) -> Vec<FlowTotals> {
    let mut totals = aggregate(records, selection, &[Level::Cabinet]);
    totals.sort_by(|a, b| b.withdrawals.cmp(&a.withdrawals));
    totals
}

/// Distinct cabinets with any row in the selection, ascending.
pub fn cabinet_options(records: &[EnrichedRecord], selection: &Selection) -> Vec<String> {
    let mut cabinets: Vec<String> = selection
        .filter(records, &[Level::Cabinet])
        .map(|r| r.cabinet().to_string())
        .collect();
    cabinets.sort();
    cabinets.dedup();
    cabinets
}

/// Picks the cabinet a drilldown should open on.
///
/// `requested` wins when it has data in the selection; otherwise the cabinet
/// with the largest total for `transaction_type`, otherwise the first option.
pub fn default_cabinet(
    table: &EnrichedTable,
    selection: &Selection,
    transaction_type: &TransactionType,
    requested: Option<&str>,
) -> Option<String> {
    let options = cabinet_options(table.records(), selection);
    if let Some(req) = requested {
        if options.iter().any(|c| c == req) {
            return Some(req.to_string());
        }
    }

    let sums = sum_amounts(
        selection.filter(table.records(), &[Level::Cabinet]),
        transaction_type,
        &[Level::Cabinet],
    );
    // max_by returns the last maximum; ties go to the first cabinet in key order.
    let best = sums
        .iter()
        .rev()
        .max_by(|a, b| a.amount.cmp(&b.amount))
        .and_then(|s| s.key.first().cloned());

    best.or_else(|| options.into_iter().next())
}

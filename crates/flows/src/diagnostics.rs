use dts_core::{Amount, DateRange, EnrichedRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// One unmapped category, totalled over the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappedCategory {
    pub transaction_type: String,
    pub transaction_catg: String,
    pub transaction_catg_desc: String,
    pub amount: Amount,
}

/// What still needs adding to the mapping file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnmappedReport {
    /// Unmapped rows in the range, before grouping.
    pub rows: usize,
    /// Largest first, at most `limit` entries.
    pub categories: Vec<UnmappedCategory>,
}

impl UnmappedReport {
    pub fn is_clean(&self) -> bool {
        self.rows == 0
    }
}

pub fn unmapped_report(records: &[EnrichedRecord], range: DateRange, limit: usize) -> UnmappedReport {
    let mut rows = 0usize;
    let mut groups: BTreeMap<(String, String, String), Amount> = BTreeMap::new();
    for r in records
        .iter()
        .filter(|r| range.contains(r.record_date()) && r.is_unmapped())
    {
        rows += 1;
        let key = (
            r.transaction_type().to_string(),
            r.transaction.key.transaction_catg.clone(),
            r.transaction.key.transaction_catg_desc.clone(),
        );
        *groups.entry(key).or_default() += r.amount();
    }

    let mut categories: Vec<UnmappedCategory> = groups
        .into_iter()
        .map(|((ty, catg, desc), amount)| UnmappedCategory {
            transaction_type: ty,
            transaction_catg: catg,
            transaction_catg_desc: desc,
            amount,
        })
        .collect();
    categories.sort_by(|a, b| b.amount.cmp(&a.amount));
    categories.truncate(limit);

    if rows > 0 {
        tracing::warn!("Unmapped rows in {range}: {rows}. Add them to the mapping file.");
    }

    UnmappedReport { rows, categories }
}

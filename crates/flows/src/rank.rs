use dts_core::Amount;
use serde::Serialize;
use std::collections::BTreeMap;

/// Label of the synthetic child that absorbs everything below the top N.
pub const OTHER_LABEL: &str = "Other (all remaining programs)";

/// A child's total within its parent (e.g. a program within an agency).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildSum {
    pub parent: String,
    pub child: String,
    pub amount: Amount,
}

impl ChildSum {
    pub fn new(parent: impl Into<String>, child: impl Into<String>, amount: Amount) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            amount,
        }
    }

    pub fn is_other(&self) -> bool {
        self.child == OTHER_LABEL
    }
}

/// Keeps the `top_n` largest children of each parent and folds the rest into
/// a single [`OTHER_LABEL`] child.
///
/// Ranking is per parent, descending by amount; equal amounts keep their input
/// order. Kept children come out first, parents ascending, followed by every
/// Other row in the same parent order.
pub fn rank_and_bucket(rows: &[ChildSum], top_n: usize) -> Vec<ChildSum> {
    let mut by_parent: BTreeMap<&str, Vec<&ChildSum>> = BTreeMap::new();
    for row in rows {
        by_parent.entry(row.parent.as_str()).or_default().push(row);
    }

    let mut out = Vec::with_capacity(rows.len());
    let mut others = Vec::new();
    for (parent, mut children) in by_parent {
        // Stable sort: ties stay in input order.
        children.sort_by(|a, b| b.amount.cmp(&a.amount));

        let split = top_n.min(children.len());
        out.extend(children[..split].iter().map(|c| (*c).clone()));

        let rest = &children[split..];
        if !rest.is_empty() {
            let amount: Amount = rest.iter().map(|c| c.amount).sum();
            others.push(ChildSum::new(parent, OTHER_LABEL, amount));
        }
    }
    out.extend(others);
    out
}

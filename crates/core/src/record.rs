use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::amount::Amount;

/// Rollup value given to transactions whose category has no mapping row.
pub const UNMAPPED: &str = "Unmapped";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionType {
    Deposits,
    Withdrawals,
    Other(String),
}

impl TransactionType {
    /// Exact, case-sensitive match on the two labels the DTS publishes.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Deposits" => TransactionType::Deposits,
            "Withdrawals" => TransactionType::Withdrawals,
            other => TransactionType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Deposits => "Deposits",
            TransactionType::Withdrawals => "Withdrawals",
            TransactionType::Other(s) => s,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    /// Lenient, case-insensitive parse for user input. Only the two flow
    /// directions are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposits" | "deposit" => Ok(TransactionType::Deposits),
            "withdrawals" | "withdrawal" => Ok(TransactionType::Withdrawals),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

/// Join key shared by transactions and the category mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryKey {
    pub transaction_catg: String,
    pub transaction_catg_desc: String,
}

impl CategoryKey {
    pub fn new(catg: impl Into<String>, desc: impl Into<String>) -> Self {
        CategoryKey {
            transaction_catg: catg.into(),
            transaction_catg_desc: desc.into(),
        }
    }
}

/// One cleaned row of the deposits/withdrawals table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub record_date: NaiveDate,
    pub account_type: String,
    pub transaction_type: TransactionType,
    pub key: CategoryKey,
    /// Base units, already scaled up from the reported millions.
    pub transaction_today_amt: Amount,
}

/// One row of the category mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub key: CategoryKey,
    pub rollup: Rollup,
    /// Kept for QA only; never part of the join.
    pub transaction_type: Option<String>,
}

/// The cabinet → agency → program hierarchy attached to a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rollup {
    pub cabinet_supercategory: String,
    pub agency_rollup: String,
    pub program_rollup: String,
}

impl Rollup {
    pub fn new(cabinet: impl Into<String>, agency: impl Into<String>, program: impl Into<String>) -> Self {
        Rollup {
            cabinet_supercategory: cabinet.into(),
            agency_rollup: agency.into(),
            program_rollup: program.into(),
        }
    }

    pub fn unmapped() -> Self {
        Rollup::new(UNMAPPED, UNMAPPED, UNMAPPED)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub transaction: TransactionRecord,
    pub rollup: Rollup,
}

impl EnrichedRecord {
    pub fn record_date(&self) -> NaiveDate {
        self.transaction.record_date
    }

    pub fn transaction_type(&self) -> &TransactionType {
        &self.transaction.transaction_type
    }

    pub fn amount(&self) -> Amount {
        self.transaction.transaction_today_amt
    }

    pub fn cabinet(&self) -> &str {
        &self.rollup.cabinet_supercategory
    }

    pub fn agency(&self) -> &str {
        &self.rollup.agency_rollup
    }

    pub fn program(&self) -> &str {
        &self.rollup.program_rollup
    }

    pub fn is_unmapped(&self) -> bool {
        self.cabinet() == UNMAPPED
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use dts_core::{Amount, CategoryKey, TransactionRecord, TransactionType};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::LoadError;
use crate::schema::{require_columns, ColumnIndex};

pub const RECORD_DATE: &str = "record_date";
pub const ACCOUNT_TYPE: &str = "account_type";
pub const TRANSACTION_TYPE: &str = "transaction_type";
pub const TRANSACTION_CATG: &str = "transaction_catg";
pub const TRANSACTION_CATG_DESC: &str = "transaction_catg_desc";
pub const TRANSACTION_TODAY_AMT: &str = "transaction_today_amt";

const REQUIRED_COLUMNS: &[&str] = &[
    RECORD_DATE,
    ACCOUNT_TYPE,
    TRANSACTION_TYPE,
    TRANSACTION_CATG,
    TRANSACTION_CATG_DESC,
    TRANSACTION_TODAY_AMT,
];

/// `account_type` values that carry running TGA totals rather than movements.
pub const TGA_TOTAL_LABELS: &[&str] = &[
    "TGA Total Deposits",
    "TGA Total Withdrawals",
    "Treasury General Account Total Deposits",
    "Treasury General Account Total Withdrawals",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m-%d-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Clone)]
pub struct TransactionLoadOptions {
    pub tga_total_labels: Vec<String>,
}

impl Default for TransactionLoadOptions {
    fn default() -> Self {
        Self {
            tga_total_labels: TGA_TOTAL_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Row counts from one load, for the operator log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub bad_dates: usize,
    pub tga_totals: usize,
    pub zero_amounts: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionTable {
    pub records: Vec<TransactionRecord>,
    pub stats: LoadStats,
}

/// Parses a date in any of the formats the DTS export has used.
/// `None` means the row should be dropped.
pub fn parse_record_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses an amount in millions as a plain or scientific-notation number.
/// Anything else (including `1,234`, `$7` or `(3.25)`) coerces to zero.
pub fn parse_millions(s: &str) -> Decimal {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

pub fn read_transactions<R: Read>(
    data: R,
    options: &TransactionLoadOptions,
) -> Result<TransactionTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    require_columns("Deposits/Withdrawals CSV", &headers, REQUIRED_COLUMNS)?;
    let columns = ColumnIndex::new(&headers);

    let mut stats = LoadStats::default();
    let mut records = Vec::new();
    let mut total_like_labels = 0usize;

    for result in reader.records() {
        let record = result?;
        stats.rows_read += 1;

        let Some(record_date) = parse_record_date(columns.field(&record, RECORD_DATE)) else {
            tracing::debug!(
                "Dropping row {}: unparsable record_date {:?}",
                stats.rows_read,
                columns.field(&record, RECORD_DATE)
            );
            stats.bad_dates += 1;
            continue;
        };

        let raw_amount = columns.field(&record, TRANSACTION_TODAY_AMT);
        let amount = Amount::from_millions(parse_millions(raw_amount)).unwrap_or_else(|| {
            tracing::debug!("Row {}: amount {raw_amount:?} out of range, treating as 0", stats.rows_read);
            Amount::zero()
        });

        let account_type = columns.field(&record, ACCOUNT_TYPE).trim();
        if options.tga_total_labels.iter().any(|l| l == account_type) {
            stats.tga_totals += 1;
            continue;
        }
        if account_type.to_lowercase().contains("total") {
            total_like_labels += 1;
        }

        if amount.is_zero() {
            stats.zero_amounts += 1;
            continue;
        }

        records.push(TransactionRecord {
            record_date,
            account_type: account_type.to_string(),
            transaction_type: TransactionType::parse(columns.field(&record, TRANSACTION_TYPE)),
            key: CategoryKey::new(
                columns.field(&record, TRANSACTION_CATG).trim(),
                columns.field(&record, TRANSACTION_CATG_DESC).trim(),
            ),
            transaction_today_amt: amount,
        });
    }

    stats.kept = records.len();

    if stats.tga_totals == 0 && total_like_labels > 0 {
        tracing::warn!(
            "No rows matched the TGA total labels {:?}, but {} rows have an account_type containing \
             'total'; the labels may be stale and totals may be double-counted",
            options.tga_total_labels,
            total_like_labels
        );
    }

    tracing::info!(
        "Loaded {} of {} transaction rows ({} bad dates, {} TGA totals, {} zero amounts)",
        stats.kept,
        stats.rows_read,
        stats.bad_dates,
        stats.tga_totals,
        stats.zero_amounts
    );

    Ok(TransactionTable { records, stats })
}

pub fn load_transactions(
    path: &Path,
    options: &TransactionLoadOptions,
) -> Result<TransactionTable, LoadError> {
    tracing::info!("Reading transactions from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_transactions(file, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str =
        "record_date,account_type,transaction_type,transaction_catg,transaction_catg_desc,transaction_today_amt\n";

    fn load(body: &str) -> TransactionTable {
        let data = format!("{HEADER}{body}");
        read_transactions(data.as_bytes(), &TransactionLoadOptions::default()).unwrap()
    }

    // ── parse_millions ────────────────────────────────────────────────────────

    #[test]
    fn parse_millions_plain_and_scientific() {
        assert_eq!(parse_millions("12.5"), dec!(12.5));
        assert_eq!(parse_millions(" -3.25 "), dec!(-3.25));
        assert_eq!(parse_millions("1.5e3"), dec!(1500));
    }

    #[test]
    fn parse_millions_formatted_text_is_zero() {
        assert_eq!(parse_millions("1,234"), Decimal::ZERO);
        assert_eq!(parse_millions("$7"), Decimal::ZERO);
        assert_eq!(parse_millions("(3.25)"), Decimal::ZERO);
    }

    #[test]
    fn parse_millions_non_numeric_is_zero() {
        assert_eq!(parse_millions("null"), Decimal::ZERO);
        assert_eq!(parse_millions(""), Decimal::ZERO);
        assert_eq!(parse_millions("()"), Decimal::ZERO);
    }

    // ── parse_record_date ─────────────────────────────────────────────────────

    #[test]
    fn parse_record_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_record_date("2024-01-05"), Some(expected));
        assert_eq!(parse_record_date("01/05/2024"), Some(expected));
        assert_eq!(parse_record_date("2024/01/05"), Some(expected));
        assert_eq!(parse_record_date("2024-01-05 00:00:00"), Some(expected));
        assert_eq!(parse_record_date("2024-01-05T13:45:00"), Some(expected));
    }

    #[test]
    fn parse_record_date_invalid() {
        assert_eq!(parse_record_date("not-a-date"), None);
        assert_eq!(parse_record_date(""), None);
        assert_eq!(parse_record_date("2024-02-30"), None);
    }

    // ── read_transactions ─────────────────────────────────────────────────────

    #[test]
    fn amounts_are_scaled_from_millions() {
        let table = load("2024-01-05,Federal Reserve Account,Deposits,A,Taxes,12.5\n");
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].transaction_today_amt.as_decimal(), dec!(12500000));
    }

    #[test]
    fn tga_total_rows_are_excluded() {
        let table = load(
            "2024-01-05,TGA Total Deposits,Deposits,,,900\n\
             2024-01-05,TGA Total Withdrawals,Withdrawals,,,800\n\
             2024-01-05,Treasury General Account Total Deposits,Deposits,,,900\n\
             2024-01-05,Treasury General Account (TGA),Deposits,A,Taxes,5\n",
        );
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.stats.tga_totals, 3);
        assert!(table
            .records
            .iter()
            .all(|r| !TGA_TOTAL_LABELS.contains(&r.account_type.as_str())));
    }

    #[test]
    fn zero_rows_dropped_but_tiny_rows_kept() {
        let table = load(
            "2024-01-05,Acct,Deposits,A,Taxes,0\n\
             2024-01-05,Acct,Deposits,A,Taxes,0.0\n\
             2024-01-05,Acct,Deposits,A,Taxes,not-a-number\n\
             2024-01-05,Acct,Deposits,B,Fees,0.0001\n",
        );
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.stats.zero_amounts, 3);
        assert_eq!(table.records[0].key.transaction_catg, "B");
        assert_eq!(table.records[0].transaction_today_amt.as_decimal(), dec!(100));
    }

    #[test]
    fn overflowing_amount_is_dropped_as_zero() {
        let table = load(
            "2024-01-05,Acct,Deposits,A,Taxes,1e25\n\
             2024-01-05,Acct,Deposits,B,Fees,1\n",
        );
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.stats.zero_amounts, 1);
        assert_eq!(table.records[0].key.transaction_catg, "B");
        assert_eq!(table.records[0].transaction_today_amt.as_decimal(), dec!(1000000));
    }

    #[test]
    fn formatted_amounts_are_dropped_as_zero() {
        let table = load(
            "2024-01-05,Acct,Deposits,A,Taxes,\"1,234\"\n\
             2024-01-05,Acct,Deposits,A,Taxes,$7\n\
             2024-01-05,Acct,Deposits,A,Taxes,(3.25)\n",
        );
        assert!(table.records.is_empty());
        assert_eq!(table.stats.zero_amounts, 3);
    }

    #[test]
    fn bad_dates_are_dropped_not_errors() {
        let table = load(
            "garbage,Acct,Deposits,A,Taxes,1\n\
             2024-01-06,Acct,Withdrawals,A,Taxes,2\n",
        );
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.stats.bad_dates, 1);
        assert_eq!(table.stats.rows_read, 2);
    }

    #[test]
    fn string_columns_are_trimmed_case_preserved() {
        let table = load("2024-01-05, Acct , Deposits ,  Catg A , Some Desc ,1\n");
        let r = &table.records[0];
        assert_eq!(r.account_type, "Acct");
        assert_eq!(r.transaction_type, TransactionType::Deposits);
        assert_eq!(r.key, CategoryKey::new("Catg A", "Some Desc"));
    }

    #[test]
    fn missing_columns_fail_fast() {
        let data = "record_date,account_type,transaction_type\n2024-01-05,Acct,Deposits\n";
        let err = read_transactions(data.as_bytes(), &TransactionLoadOptions::default()).unwrap_err();
        match err {
            LoadError::Schema(e) => assert_eq!(
                e.missing,
                vec!["transaction_catg", "transaction_catg_desc", "transaction_today_amt"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_tga_labels() {
        let options = TransactionLoadOptions {
            tga_total_labels: vec!["Closing Balance Total".to_string()],
        };
        let data = format!("{HEADER}2024-01-05,Closing Balance Total,Deposits,A,B,1\n2024-01-05,TGA Total Deposits,Deposits,A,B,1\n");
        let table = read_transactions(data.as_bytes(), &options).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].account_type, "TGA Total Deposits");
    }
}

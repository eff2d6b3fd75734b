use chrono::Datelike;
use dts_core::{DateRange, EnrichedRecord, Rollup, TransactionRecord};
use dts_import::CategoryMap;

/// Transactions joined with their rollups. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedTable {
    records: Vec<EnrichedRecord>,
}

impl EnrichedTable {
    pub fn new(records: Vec<EnrichedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest record dates, or `None` for an empty table.
    pub fn date_bounds(&self) -> Option<DateRange> {
        let min = self.records.iter().map(EnrichedRecord::record_date).min()?;
        let max = self.records.iter().map(EnrichedRecord::record_date).max()?;
        Some(DateRange::new(min, max))
    }

    /// The trailing year ending at the latest record, clamped to the data.
    pub fn default_range(&self) -> Option<DateRange> {
        let bounds = self.date_bounds()?;
        Some(DateRange::trailing_year(bounds.end).clamp_to(bounds))
    }

    /// Distinct calendar years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.record_date().year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn unmapped_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_unmapped()).count()
    }
}

/// Left-joins `transactions` to `mapping` on the category key.
///
/// Every transaction yields exactly one output row; keys absent from the
/// mapping get [`Rollup::unmapped`].
pub fn enrich(transactions: &[TransactionRecord], mapping: &CategoryMap) -> EnrichedTable {
    let records: Vec<EnrichedRecord> = transactions
        .iter()
        .map(|tx| EnrichedRecord {
            transaction: tx.clone(),
            rollup: mapping
                .get(&tx.key)
                .map(|m| m.rollup.clone())
                .unwrap_or_else(Rollup::unmapped),
        })
        .collect();

    let table = EnrichedTable::new(records);
    let unmapped = table.unmapped_count();
    if unmapped > 0 {
        tracing::warn!(
            "{unmapped} of {} transactions have no category mapping",
            table.len()
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dts_core::{Amount, CategoryKey, MappingRecord, TransactionType, UNMAPPED};
    use rust_decimal_macros::dec;

    fn tx(day: u32, catg: &str) -> TransactionRecord {
        TransactionRecord {
            record_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            account_type: "Federal Reserve Account".to_string(),
            transaction_type: TransactionType::Deposits,
            key: CategoryKey::new(catg, "desc"),
            transaction_today_amt: Amount::from_decimal(dec!(1000000)),
        }
    }

    fn mapping(rows: &[(&str, &str)]) -> CategoryMap {
        CategoryMap::from_records(rows.iter().map(|(catg, cabinet)| MappingRecord {
            key: CategoryKey::new(*catg, "desc"),
            rollup: Rollup::new(*cabinet, "Agency", "Program"),
            transaction_type: None,
        }))
    }

    #[test]
    fn row_count_is_preserved() {
        let txs = vec![tx(1, "A"), tx(2, "A"), tx(3, "B")];
        let table = enrich(&txs, &mapping(&[("A", "Treasury")]));
        assert_eq!(table.len(), txs.len());
    }

    #[test]
    fn empty_mapping_marks_everything_unmapped() {
        let txs = vec![tx(1, "A"), tx(2, "B")];
        let table = enrich(&txs, &CategoryMap::default());
        assert_eq!(table.len(), 2);
        assert!(table.records().iter().all(|r| r.rollup == Rollup::unmapped()));
        assert_eq!(table.unmapped_count(), 2);
    }

    #[test]
    fn duplicate_mapping_rows_do_not_fan_out() {
        let txs = vec![tx(1, "A")];
        let table = enrich(&txs, &mapping(&[("A", "Treasury"), ("A", "Defense")]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].cabinet(), "Treasury");
    }

    #[test]
    fn unmatched_rows_get_sentinel_in_all_levels() {
        let txs = vec![tx(1, "A"), tx(1, "Z")];
        let table = enrich(&txs, &mapping(&[("A", "Treasury")]));
        let z = &table.records()[1];
        assert_eq!(z.cabinet(), UNMAPPED);
        assert_eq!(z.agency(), UNMAPPED);
        assert_eq!(z.program(), UNMAPPED);
    }

    #[test]
    fn bounds_and_years() {
        let mut txs = vec![tx(5, "A"), tx(2, "A")];
        txs.push(TransactionRecord {
            record_date: NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
            ..tx(1, "A")
        });
        let table = enrich(&txs, &CategoryMap::default());
        let bounds = table.date_bounds().unwrap();
        assert_eq!(bounds.start, NaiveDate::from_ymd_opt(2023, 12, 29).unwrap());
        assert_eq!(bounds.end, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(table.years(), vec![2023, 2024]);
        // Less than a year of data: the default window is the whole table.
        assert_eq!(table.default_range(), Some(bounds));
    }

    #[test]
    fn empty_table_has_no_bounds() {
        let table = EnrichedTable::default();
        assert_eq!(table.date_bounds(), None);
        assert_eq!(table.default_range(), None);
        assert!(table.years().is_empty());
    }
}

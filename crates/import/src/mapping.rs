use dts_core::{CategoryKey, MappingRecord, Rollup, UNMAPPED};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;
use crate::schema::{require_columns, ColumnIndex};
use crate::transactions::{TRANSACTION_CATG, TRANSACTION_CATG_DESC, TRANSACTION_TYPE};

pub const CABINET_SUPERCATEGORY: &str = "cabinet_supercategory";
pub const AGENCY_ROLLUP: &str = "agency_rollup";
pub const PROGRAM_ROLLUP: &str = "program_rollup";

/// Misspelled header found in older mapping files.
const LEGACY_CATG_DESC: &str = "transaction_cetg_desc";

const REQUIRED_COLUMNS: &[&str] = &[
    TRANSACTION_CATG,
    TRANSACTION_CATG_DESC,
    CABINET_SUPERCATEGORY,
    AGENCY_ROLLUP,
    PROGRAM_ROLLUP,
];

/// Category mapping with a unique join key.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    records: Vec<MappingRecord>,
    index: HashMap<CategoryKey, usize>,
    duplicates: usize,
}

impl CategoryMap {
    /// Builds the map, keeping the first row seen for each key.
    pub fn from_records(records: impl IntoIterator<Item = MappingRecord>) -> Self {
        let mut map = CategoryMap::default();
        for record in records {
            if map.index.contains_key(&record.key) {
                map.duplicates += 1;
                continue;
            }
            map.index.insert(record.key.clone(), map.records.len());
            map.records.push(record);
        }
        map
    }

    pub fn get(&self, key: &CategoryKey) -> Option<&MappingRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[MappingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped because their key was already present.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

fn rollup_level(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        UNMAPPED.to_string()
    } else {
        value.to_string()
    }
}

pub fn read_category_map<R: Read>(data: R) -> Result<CategoryMap, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let mut headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if !headers.iter().any(|h| h == TRANSACTION_CATG_DESC) {
        if let Some(h) = headers.iter_mut().find(|h| h.as_str() == LEGACY_CATG_DESC) {
            tracing::debug!("Renaming legacy column {LEGACY_CATG_DESC} → {TRANSACTION_CATG_DESC}");
            *h = TRANSACTION_CATG_DESC.to_string();
        }
    }

    require_columns("Mapping file", &headers, REQUIRED_COLUMNS)?;
    let columns = ColumnIndex::new(&headers);
    let has_type = columns.contains(TRANSACTION_TYPE);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(MappingRecord {
            key: CategoryKey::new(
                columns.field(&record, TRANSACTION_CATG).trim(),
                columns.field(&record, TRANSACTION_CATG_DESC).trim(),
            ),
            rollup: Rollup::new(
                rollup_level(columns.field(&record, CABINET_SUPERCATEGORY)),
                rollup_level(columns.field(&record, AGENCY_ROLLUP)),
                rollup_level(columns.field(&record, PROGRAM_ROLLUP)),
            ),
            transaction_type: has_type
                .then(|| columns.field(&record, TRANSACTION_TYPE).trim().to_string())
                .filter(|s| !s.is_empty()),
        });
    }

    let map = CategoryMap::from_records(rows);
    if map.duplicates() > 0 {
        tracing::warn!(
            "Mapping file has {} duplicate (transaction_catg, transaction_catg_desc) rows; kept the first of each",
            map.duplicates()
        );
    }
    tracing::info!("Loaded {} category mappings", map.len());

    Ok(map)
}

pub fn load_category_map(path: &Path) -> Result<CategoryMap, LoadError> {
    tracing::info!("Reading category mapping from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_category_map(file)
}

pub mod error;
pub mod fingerprint;
pub mod locate;
pub mod mapping;
pub mod schema;
pub mod transactions;
pub(crate) mod util;

pub use error::LoadError;
pub use fingerprint::{sha256_file, to_hex, FileFingerprint};
pub use locate::{FileLocator, LocateError, MAPPING_CANDIDATES, TRANSACTIONS_CANDIDATES};
pub use mapping::{load_category_map, read_category_map, CategoryMap};
pub use schema::{require_columns, ColumnIndex, SchemaError};
pub use transactions::{
    load_transactions, parse_millions, parse_record_date, read_transactions, LoadStats,
    TransactionLoadOptions, TransactionTable, TGA_TOTAL_LABELS,
};

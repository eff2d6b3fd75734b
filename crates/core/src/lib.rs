pub mod amount;
pub mod period;
pub mod record;

pub use amount::Amount;
pub use period::{DateRange, PeriodError};
pub use record::{
    CategoryKey, EnrichedRecord, MappingRecord, Rollup, TransactionRecord, TransactionType, UNMAPPED,
};

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// crates/basic-cleaning-core/src/error.rs

use artifact_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("Failed to resolve input artifact: {0}")]
    Resolution(#[source] StoreError),

    #[error("Dataset format error: {0}")]
    Format(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to publish output artifact: {0}")]
    Publish(#[source] StoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Polars operation failed: {0}")]
    Dataframe(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, CleaningError>;

pub mod dataset;
pub mod dates;
pub mod error;
pub mod filters;
pub mod pipeline;

pub use error::{CleaningError, Result};
pub use filters::PriceRange;
pub use pipeline::{clean_dataset, run_cleaning, CleaningRequest, CleaningStats, CleaningSummary};

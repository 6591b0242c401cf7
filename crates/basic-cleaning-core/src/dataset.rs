use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use tracing::info;

use crate::error::{CleaningError, Result};

pub const PRICE_COLUMN: &str = "price";
pub const LAST_REVIEW_COLUMN: &str = "last_review";
pub const REQUIRED_COLUMNS: [&str; 2] = [PRICE_COLUMN, LAST_REVIEW_COLUMN];

/// Read only the header row, failing with a format error when a required column is absent.
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| csv_error(path, err))?;
    let header: Vec<String> = reader
        .headers()
        .map_err(|err| csv_error(path, err))?
        .iter()
        .map(|name| name.to_string())
        .collect();

    if header.iter().all(|name| name.is_empty()) {
        return Err(CleaningError::Format(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = header.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(CleaningError::Format(format!(
            "{} has duplicate column '{duplicate}'",
            path.display()
        )));
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !header.iter().any(|name| name == required))
        .collect();
    if !missing.is_empty() {
        return Err(CleaningError::Format(format!(
            "{} is missing required column(s): {}",
            path.display(),
            missing.join(", ")
        )));
    }

    Ok(header)
}

/// Load a comma-separated file with every column kept as text, so fields the cleaner
/// does not touch are written back exactly as they were read.
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    let header = read_header(path)?;
    let schema = Schema::from_iter(
        header
            .iter()
            .map(|name| (PlSmallStr::from(name.as_str()), DataType::String)),
    );

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema(Some(Arc::new(schema)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .map_err(|err| CleaningError::Format(format!("{}: {err}", path.display())))?;

    info!(
        rows = df.height(),
        columns = df.width(),
        "Loaded dataset"
    );
    Ok(df)
}

/// Write header and rows as comma-separated text, without any row-index column.
pub fn write_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

fn csv_error(path: &Path, err: csv::Error) -> CleaningError {
    match err.kind() {
        csv::ErrorKind::Io(io) => CleaningError::Io(std::io::Error::new(
            io.kind(),
            format!("{}: {io}", path.display()),
        )),
        _ => CleaningError::Format(format!("{}: {err}", path.display())),
    }
}

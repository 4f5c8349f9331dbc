//! CSV reading operations.

use std::{fs::File, io::Cursor, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::CsvReadOptions};

use crate::error::AreaWeightError;

/// Reads a CSV file with a header row, every column as a string.
///
/// Ids keep their leading zeros and numbers are parsed later, per cell.
pub(crate) fn read_csv_strings(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| AreaWeightError::data_source(path, format!("failed to open CSV file: {e}")))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| AreaWeightError::data_source(path, format!("failed to read CSV: {e}")).into())
}

/// Reads an all-string CSV from a string.
pub(crate) fn read_csv_strings_from_str(csv: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(csv.as_bytes()))
        .finish()
        .context("[io::csv::read] Failed to read CSV from string")
}

use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};
use polars::frame::DataFrame;
use tracing::debug;

use crate::error::AreaWeightError;
use crate::io::csv::{read_csv_strings, read_csv_strings_from_str};

/// Attribute rows from an external table, keyed by an id column.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    data: DataFrame,
    id_column: String,
    rows: AHashMap<String, usize>, // id -> row, later rows win
}

impl AttributeTable {
    /// Read a CSV table whose `id_column` matches the from-layer ids.
    pub fn from_csv(path: &Path, id_column: &str) -> Result<Self> {
        let df = read_csv_strings(path)?;
        Self::from_dataframe(df, id_column)
            .map_err(|e| AreaWeightError::data_source(path, format!("{e:#}")).into())
    }

    /// Parse a CSV table from a string.
    pub fn from_csv_str(csv: &str, id_column: &str) -> Result<Self> {
        Self::from_dataframe(read_csv_strings_from_str(csv)?, id_column)
    }

    /// Index an all-string DataFrame by `id_column`.
    pub fn from_dataframe(data: DataFrame, id_column: &str) -> Result<Self> {
        let ids = data.column(id_column)
            .with_context(|| format!("[table] id column '{id_column}' not found"))?
            .str()
            .with_context(|| format!("[table] id column '{id_column}' is not a string column"))?;

        let mut rows = AHashMap::with_capacity(ids.len());
        for (row, id) in ids.into_iter().enumerate() {
            if let Some(id) = id {
                rows.insert(id.to_string(), row);
            }
        }
        debug!(rows = data.height(), ids = rows.len(), "indexed attribute table");

        Ok(Self { id_column: id_column.to_string(), rows, data })
    }

    /// Number of rows.
    #[inline] pub fn len(&self) -> usize { self.data.height() }

    /// Name of the id column.
    #[inline] pub fn id_column(&self) -> &str { &self.id_column }

    /// Check whether the table has a column called `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.data.get_column_names().iter().any(|column| column.as_str() == name)
    }

    /// Fail with `MissingAttribute` unless every requested column exists.
    pub fn require_columns(&self, columns: &[String]) -> Result<()> {
        match columns.iter().find(|column| !self.has_column(column)) {
            Some(column) => Err(AreaWeightError::MissingAttribute { id: None, attribute: column.clone() }.into()),
            None => Ok(()),
        }
    }

    /// Raw cell text for row `id`, column `column`.
    pub fn value(&self, id: &str, column: &str) -> Option<&str> {
        let row = *self.rows.get(id)?;
        self.data.column(column).ok()?.str().ok()?.get(row)
    }
}

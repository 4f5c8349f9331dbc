use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds that abort an area-weighting run.
///
/// Library functions return `anyhow::Result`; these variants sit at the root
/// of the error chain and can be recovered with `downcast_ref`.
#[derive(Debug, Error)]
pub enum AreaWeightError {
    /// An output or contribution path is unusable (usually: it already exists).
    #[error("{what} file '{}' already exists", path.display())]
    Configuration { what: &'static str, path: PathBuf },

    /// Output and contribution files point at the same path.
    #[error("output and contribution files are both '{}'", path.display())]
    DuplicateOutput { path: PathBuf },

    /// A requested attribute is absent for a source id (or, with no id, from every row).
    #[error("attribute '{attribute}' missing{}", id.as_ref().map(|id| format!(" for from-id '{id}'")).unwrap_or_default())]
    MissingAttribute { id: Option<String>, attribute: String },

    /// A requested attribute is present but not numeric.
    #[error("attribute '{attribute}' for from-id '{id}' is not numeric: '{value}'")]
    InvalidAttribute { id: String, attribute: String, value: String },

    /// An id field is missing from a feature.
    #[error("{layer} feature {feature} has no field '{field}'")]
    MissingField { layer: &'static str, feature: usize, field: String },

    /// A layer or table could not be opened or decoded.
    #[error("data source '{}': {reason}", path.display())]
    DataSource { path: PathBuf, reason: String },

    /// A spatial reference could not be resolved or a transform failed.
    #[error("projection: {0}")]
    Projection(String),
}

impl AreaWeightError {
    pub(crate) fn data_source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DataSource { path: path.into(), reason: reason.into() }
    }
}

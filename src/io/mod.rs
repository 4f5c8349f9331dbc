//! IO module for format-specific reading and writing operations.
//!
//! # Format Modules
//!
//! - `shp` - Shapefile polygon layers (with `.prj` spatial reference)
//! - `geojson` - GeoJSON polygon layers
//! - `csv` - external attribute tables (read) and result records (write)

pub(crate) mod csv;
mod geojson;
mod shp;

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use crate::error::AreaWeightError;
use crate::geom::SpatialRef;
use crate::layer::{FeatureLayer, VectorLayer};

pub use self::csv::CsvSink;
pub use self::geojson::parse_geojson;

/// Open a polygon layer by file extension.
///
/// `srs` replaces whatever spatial reference the file declares.
pub fn open_layer(path: &Path, srs: Option<SpatialRef>) -> Result<VectorLayer> {
    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let mut layer = match extension.as_deref() {
        Some("shp") => shp::read_shapefile(path)?,
        Some("geojson" | "json") => geojson::read_geojson(path)?,
        _ => return Err(AreaWeightError::data_source(path, "unsupported layer format (expected .shp, .geojson or .json)").into()),
    };

    if srs.is_some() {
        debug!(path = %path.display(), "overriding layer spatial reference");
        layer.set_spatial_ref(srs);
    }

    info!(
        "Opened '{}': {} features, CRS {}",
        path.display(),
        layer.len(),
        layer.spatial_ref().map_or("unknown".to_string(), |srs| srs.to_string()),
    );
    Ok(layer)
}

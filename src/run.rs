use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use tracing::info;

use crate::error::AreaWeightError;
use crate::geom::{layer_transform, SpatialRef};
use crate::io::{
    csv::{create_new_file, ensure_new_file},
    open_layer, CsvSink,
};
use crate::layer::FeatureLayer;
use crate::table::AttributeTable;
use crate::weight::{AggregateRecord, AreaWeighter, ContributionRecord, RecordSink, WeightOptions};

/// Everything one `areaweight` run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Layer with the attributes to weight.
    pub from_layer: PathBuf,
    /// Layer receiving the weighted attributes.
    pub to_layer: PathBuf,
    pub from_id: String,
    pub to_id: String,
    pub attributes: Vec<String>,
    pub buffer: Option<f64>,
    pub transform_before_buffer: bool,
    pub total_area: bool,
    /// CSV table holding the attributes, when they are not on the from-layer.
    pub from_table: Option<PathBuf>,
    /// Id column of `from_table`, defaults to `from_id`.
    pub from_table_id: Option<String>,
    /// Aggregate CSV, stdout when `None`.
    pub output: Option<PathBuf>,
    /// Per-contribution CSV.
    pub contrib: Option<PathBuf>,
    /// Spatial reference overrides.
    pub from_crs: Option<SpatialRef>,
    pub to_crs: Option<SpatialRef>,
}

/// Counts reported after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub contributions: usize,
}

/// Run area weighting end to end: check paths, open inputs, weight, write CSV.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    // Refuse existing or clashing outputs before touching anything.
    if let (Some(output), Some(contrib)) = (&config.output, &config.contrib) {
        if output == contrib {
            return Err(AreaWeightError::DuplicateOutput { path: output.clone() }.into());
        }
    }
    if let Some(path) = &config.output {
        ensure_new_file(path, "Output")?;
    }
    if let Some(path) = &config.contrib {
        ensure_new_file(path, "Contrib")?;
    }

    let output: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(create_new_file(path, "Output")?),
        None => Box::new(io::stdout().lock()),
    };
    let contrib = config.contrib.as_deref()
        .map(|path| create_new_file(path, "Contrib"))
        .transpose()?;
    let mut sink: CsvSink<Box<dyn Write>, File> =
        CsvSink::new(output, contrib, &config.to_id, &config.from_id, &config.attributes)?;

    let table = config.from_table.as_deref()
        .map(|path| load_table(path, config))
        .transpose()?;

    let from_layer = open_layer(&config.from_layer, config.from_crs.clone())?;
    let to_layer = open_layer(&config.to_layer, config.to_crs.clone())?;

    let transform = layer_transform(from_layer.spatial_ref(), to_layer.spatial_ref())?;
    match &transform {
        None => info!("Layers in same projection"),
        Some(transform) => info!("Re-projecting to-layer to from-layer ({transform:?})"),
    }

    let options = WeightOptions {
        transform,
        buffer: config.buffer,
        transform_before_buffer: config.transform_before_buffer,
        total_area: config.total_area,
        progress: config.output.is_some(),
        ..WeightOptions::new(&config.from_id, &config.to_id, config.attributes.clone())
    };

    let mut counting = Counting { inner: &mut sink, contributions: 0 };
    let targets = AreaWeighter::new(&from_layer, &options)
        .with_table(table.as_ref())
        .run(&to_layer, &mut counting)?;
    let contributions = counting.contributions;
    sink.flush()?;

    info!("Weighted {} from-layer features onto {targets} to-layer features ({contributions} contributions)", from_layer.len());
    Ok(RunSummary { targets, contributions })
}

/// Counts contributions on their way to the wrapped sink.
struct Counting<S> {
    inner: S,
    contributions: usize,
}

impl<S: RecordSink> RecordSink for Counting<S> {
    fn contribution(&mut self, record: &ContributionRecord) -> Result<()> {
        self.contributions += 1;
        self.inner.contribution(record)
    }

    fn aggregate(&mut self, record: &AggregateRecord) -> Result<()> {
        self.inner.aggregate(record)
    }
}

fn load_table(path: &Path, config: &RunConfig) -> Result<AttributeTable> {
    info!("Reading attributes from '{}'", path.display());
    let id_column = config.from_table_id.as_deref().unwrap_or(&config.from_id);
    let table = AttributeTable::from_csv(path, id_column)?;
    table.require_columns(&config.attributes)?;
    Ok(table)
}

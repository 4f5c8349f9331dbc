//! Area weighting of source attributes onto target polygons.

mod cache;
mod record;

use ahash::AHashMap;
use anyhow::Result;
use tracing::{debug, info};

use crate::error::AreaWeightError;
use crate::geom::{CrsTransform, PolygonGeometry};
use crate::layer::{FeatureLayer, FieldValue};
use crate::table::AttributeTable;
use cache::SourceCache;

pub use record::{AggregateRecord, ContributionRecord, RecordSink, WeightResult};

/// Immutable settings for one weighting run.
#[derive(Debug)]
pub struct WeightOptions {
    /// Id field in the from-layer.
    pub from_id: String,
    /// Id field in the to-layer.
    pub to_id: String,
    /// Attributes to weight, read from the from-layer or the external table.
    pub attributes: Vec<String>,
    /// Transform from the to-layer CRS into the from-layer CRS.
    pub transform: Option<CrsTransform>,
    /// Distance to buffer to-layer polygons before intersection.
    pub buffer: Option<f64>,
    /// Transform before buffering instead of after.
    pub transform_before_buffer: bool,
    /// Use the full area of each source polygon instead of the intersection area.
    pub total_area: bool,
    /// Log every processed target at info level.
    pub progress: bool,
}

impl WeightOptions {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            attributes,
            transform: None,
            buffer: None,
            transform_before_buffer: false,
            total_area: false,
            progress: false,
        }
    }
}

/// A source id intersecting the current target.
#[derive(Debug)]
struct Hit {
    key: String,
    from_id: FieldValue,
    area: f64,
}

/// Apportions source attributes onto target polygons by overlap area.
///
/// Source areas (in total-area mode) and attribute values are cached by
/// source id for the lifetime of the weighter.
pub struct AreaWeighter<'a, L: FeatureLayer> {
    sources: &'a L,
    options: &'a WeightOptions,
    table: Option<&'a AttributeTable>,
    cache: SourceCache,
}

impl<'a, L: FeatureLayer> AreaWeighter<'a, L> {
    pub fn new(sources: &'a L, options: &'a WeightOptions) -> Self {
        Self { sources, options, table: None, cache: SourceCache::default() }
    }

    /// Read attributes from `table` instead of the source features.
    pub fn with_table(mut self, table: Option<&'a AttributeTable>) -> Self {
        self.table = table;
        self
    }

    /// Apply the configured transform and buffer to a target geometry, in configured order.
    pub fn prepare(&self, geometry: &L::Geometry) -> Result<L::Geometry> {
        let options = self.options;
        let mut geometry = geometry.clone();

        if let Some(transform) = options.transform.as_ref().filter(|_| options.transform_before_buffer) {
            geometry = transform.apply(&geometry)?;
        }
        if let Some(distance) = options.buffer {
            geometry = geometry.buffered(distance);
        }
        if let Some(transform) = options.transform.as_ref().filter(|_| !options.transform_before_buffer) {
            geometry = transform.apply(&geometry)?;
        }

        Ok(geometry)
    }

    /// Weight source attributes onto one target polygon.
    pub fn weigh_target(&mut self, to_id: FieldValue, geometry: &L::Geometry) -> Result<(AggregateRecord, Vec<ContributionRecord>)> {
        let geometry = self.prepare(geometry)?;
        let candidates = geometry.envelope()
            .map(|envelope| self.sources.spatial_filter(&envelope))
            .unwrap_or_default();

        let mut total_area = 0.0;
        let mut hits: Vec<Hit> = Vec::new();
        let mut seen: AHashMap<String, usize> = AHashMap::new();

        for idx in candidates {
            let from_geom = self.sources.geometry(idx);

            // The bbox filter returns false positives; drop anything without area.
            let overlap = geometry.intersect(from_geom).area();
            if !(overlap > 0.0) {
                continue;
            }

            let from_id = self.sources.field(idx, &self.options.from_id)
                .cloned()
                .ok_or_else(|| AreaWeightError::MissingField {
                    layer: "from-layer",
                    feature: idx,
                    field: self.options.from_id.clone(),
                })?;
            let key = from_id.to_string();

            match seen.get(&key) {
                Some(_) if self.options.total_area => {
                    debug!(from_id = %key, feature = idx, "duplicate from-id already counted at full area");
                }
                Some(&pos) => {
                    hits[pos].area += overlap;
                    total_area += overlap;
                }
                None => {
                    let area = if self.options.total_area {
                        self.cache.area_or_insert_with(&key, || from_geom.area())
                    } else {
                        overlap
                    };
                    total_area += area;
                    seen.insert(key.clone(), hits.len());
                    hits.push(Hit { key: key.clone(), from_id, area });
                }
            }

            if !self.cache.has_values(&key) {
                let values = fetch_values(self.sources, self.options, self.table, idx, &key)?;
                self.cache.insert_values(&key, values);
            }
        }

        let mut sums = vec![0.0; self.options.attributes.len()];
        let mut contributions = Vec::with_capacity(hits.len());

        for hit in &hits {
            let proportion = hit.area / total_area;
            let values = self.cache.values(&hit.key).unwrap_or_default().to_vec();
            let shares = values.iter().map(|value| proportion * value).collect::<Vec<_>>();
            for (sum, share) in sums.iter_mut().zip(&shares) {
                *sum += share;
            }

            contributions.push(ContributionRecord {
                to_id: to_id.clone(),
                from_id: hit.from_id.clone(),
                total_area,
                from_area: hit.area,
                proportion,
                values,
                shares,
            });
        }

        let aggregate = AggregateRecord { to_id, count: hits.len(), total_area, sums };
        Ok((aggregate, contributions))
    }

    /// Weight every feature of `targets`, streaming records into `sink`.
    ///
    /// Returns the number of targets processed.
    pub fn run<T, S>(&mut self, targets: &T, sink: &mut S) -> Result<usize>
    where
        T: FeatureLayer<Geometry = L::Geometry>,
        S: RecordSink + ?Sized,
    {
        for idx in 0..targets.len() {
            let to_id = targets.field(idx, &self.options.to_id)
                .cloned()
                .ok_or_else(|| AreaWeightError::MissingField {
                    layer: "to-layer",
                    feature: idx,
                    field: self.options.to_id.clone(),
                })?;

            let (aggregate, contributions) = self.weigh_target(to_id, targets.geometry(idx))?;
            for contribution in &contributions {
                sink.contribution(contribution)?;
            }
            sink.aggregate(&aggregate)?;

            if self.options.progress {
                info!("{}: {} {}", idx + 1, self.options.to_id, aggregate.to_id);
            } else {
                debug!(to_id = %aggregate.to_id, sources = aggregate.count, area = aggregate.total_area, "weighted target");
            }
        }

        Ok(targets.len())
    }
}

/// Read every requested attribute for one source id.
fn fetch_values<L: FeatureLayer>(
    sources: &L,
    options: &WeightOptions,
    table: Option<&AttributeTable>,
    idx: usize,
    key: &str,
) -> Result<Vec<f64>> {
    options.attributes.iter()
        .map(|attribute| {
            let value = match table {
                Some(table) => table.value(key, attribute).map(FieldValue::from),
                None => sources.field(idx, attribute).cloned(),
            };
            match value.as_ref().and_then(FieldValue::to_f64) {
                Some(Ok(number)) => Ok(number),
                Some(Err(text)) => Err(AreaWeightError::InvalidAttribute {
                    id: key.to_string(),
                    attribute: attribute.clone(),
                    value: text,
                }.into()),
                None => Err(AreaWeightError::MissingAttribute {
                    id: Some(key.to_string()),
                    attribute: attribute.clone(),
                }.into()),
            }
        })
        .collect()
}

/// Weight `sources` onto every feature of `targets`, collecting all records.
pub fn weight<L, T>(
    sources: &L,
    targets: &T,
    options: &WeightOptions,
    table: Option<&AttributeTable>,
) -> Result<WeightResult>
where
    L: FeatureLayer,
    T: FeatureLayer<Geometry = L::Geometry>,
{
    let mut result = WeightResult::default();
    AreaWeighter::new(sources, options)
        .with_table(table)
        .run(targets, &mut result)?;
    Ok(result)
}

use ahash::AHashMap;
use geo::{MultiPolygon, Rect};
use rstar::RTree;

use crate::geom::{envelope_of, BoundingBox, PolygonGeometry, SpatialRef};
use super::{FeatureLayer, FieldValue};

/// An in-memory polygon layer with an R-tree over feature bounding boxes.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    shapes: Vec<MultiPolygon<f64>>,
    column_index: AHashMap<String, usize>,
    records: Vec<Vec<Option<FieldValue>>>,
    rtree: RTree<BoundingBox>,
    srs: Option<SpatialRef>,
}

impl VectorLayer {
    /// Start an empty layer.
    pub fn builder() -> VectorLayerBuilder { VectorLayerBuilder::default() }

    /// Replace the layer's spatial reference.
    pub fn set_spatial_ref(&mut self, srs: Option<SpatialRef>) { self.srs = srs; }
}

impl FeatureLayer for VectorLayer {
    type Geometry = MultiPolygon<f64>;

    #[inline] fn len(&self) -> usize { self.shapes.len() }

    #[inline] fn geometry(&self, idx: usize) -> &MultiPolygon<f64> { &self.shapes[idx] }

    fn field(&self, idx: usize, name: &str) -> Option<&FieldValue> {
        let col = *self.column_index.get(name)?;
        self.records.get(idx)?.get(col)?.as_ref()
    }

    fn spatial_filter(&self, envelope: &Rect<f64>) -> Vec<usize> {
        let mut hits = self.rtree
            .locate_in_envelope_intersecting(&envelope_of(envelope))
            .map(BoundingBox::idx)
            .collect::<Vec<_>>();
        hits.sort_unstable();
        hits
    }

    #[inline] fn spatial_ref(&self) -> Option<&SpatialRef> { self.srs.as_ref() }
}

/// Accumulates features for a [`VectorLayer`].
#[derive(Debug, Default)]
pub struct VectorLayerBuilder {
    shapes: Vec<MultiPolygon<f64>>,
    column_index: AHashMap<String, usize>,
    records: Vec<Vec<Option<FieldValue>>>,
    srs: Option<SpatialRef>,
}

impl VectorLayerBuilder {
    pub fn spatial_ref(mut self, srs: Option<SpatialRef>) -> Self {
        self.srs = srs;
        self
    }

    /// Append a feature with its fields.
    pub fn push<I, K>(&mut self, shape: MultiPolygon<f64>, fields: I)
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: AsRef<str>,
    {
        let mut record: Vec<Option<FieldValue>> = Vec::new();
        for (name, value) in fields {
            let name = name.as_ref();
            let next = self.column_index.len();
            let col = *self.column_index.entry(name.to_string()).or_insert(next);
            if record.len() <= col {
                record.resize(col + 1, None);
            }
            record[col] = Some(value);
        }
        self.shapes.push(shape);
        self.records.push(record);
    }

    /// Index the geometries and freeze the layer.
    pub fn build(self) -> VectorLayer {
        let rtree = RTree::bulk_load(
            self.shapes.iter().enumerate()
                .filter_map(|(i, shape)| shape.envelope().map(|bbox| BoundingBox::new(i, bbox)))
                .collect()
        );

        VectorLayer {
            shapes: self.shapes,
            column_index: self.column_index,
            records: self.records,
            rtree,
            srs: self.srs,
        }
    }
}

mod field;
mod vector;

use geo::Rect;

use crate::geom::{PolygonGeometry, SpatialRef};

pub use field::FieldValue;
pub use vector::{VectorLayer, VectorLayerBuilder};

/// Read-only access to a polygon layer: features, fields and a bounding-box index.
pub trait FeatureLayer {
    type Geometry: PolygonGeometry;

    /// Number of features.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool { self.len() == 0 }

    /// Geometry of feature `idx`.
    fn geometry(&self, idx: usize) -> &Self::Geometry;

    /// Field `name` of feature `idx`, `None` if the feature does not carry it.
    fn field(&self, idx: usize, name: &str) -> Option<&FieldValue>;

    /// Indices (ascending) of features whose bounding box intersects `envelope`.
    /// Candidates are not guaranteed to intersect the queried geometry.
    fn spatial_filter(&self, envelope: &Rect<f64>) -> Vec<usize>;

    /// The layer's coordinate reference system, if known.
    fn spatial_ref(&self) -> Option<&SpatialRef>;
}

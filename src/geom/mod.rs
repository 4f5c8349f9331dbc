mod bbox;
mod geom;
mod proj;

pub(crate) use bbox::{envelope_of, BoundingBox};
pub use geom::PolygonGeometry;
pub use proj::{layer_transform, CrsTransform, SpatialRef};

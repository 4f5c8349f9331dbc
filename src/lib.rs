#![doc = "Area-weighted transfer of attributes between polygon layers"]
mod error;
mod geom;
mod io;
mod layer;
mod run;
mod table;
mod weight;

#[doc(inline)]
pub use error::AreaWeightError;

#[doc(inline)]
pub use geom::{layer_transform, CrsTransform, PolygonGeometry, SpatialRef};

#[doc(inline)]
pub use io::{open_layer, parse_geojson, CsvSink};

#[doc(inline)]
pub use io::csv::{aggregate_header, contribution_header};

#[doc(inline)]
pub use layer::{FeatureLayer, FieldValue, VectorLayer, VectorLayerBuilder};

#[doc(inline)]
pub use run::{run, RunConfig, RunSummary};

#[doc(inline)]
pub use table::AttributeTable;

#[doc(inline)]
pub use weight::{weight, AggregateRecord, AreaWeighter, ContributionRecord, RecordSink, WeightOptions, WeightResult};

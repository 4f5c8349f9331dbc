use std::{fs, path::Path};

use anyhow::Result;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{dbase, PolygonRing, Reader, Shape};
use tracing::warn;

use crate::error::AreaWeightError;
use crate::geom::SpatialRef;
use crate::layer::{FieldValue, VectorLayer};

/// Reads all polygons and attribute records from a `.shp` file (plus `.dbf` and `.prj`).
pub(crate) fn read_shapefile(path: &Path) -> Result<VectorLayer> {
    let mut reader = Reader::from_path(path)
        .map_err(|e| AreaWeightError::data_source(path, format!("failed to open shapefile: {e}")))?;

    let mut builder = VectorLayer::builder().spatial_ref(read_prj(path));
    for (n, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .map_err(|e| AreaWeightError::data_source(path, format!("error reading shape+record {n}: {e}")))?;

        let geometry = match shape {
            Shape::Polygon(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonM(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonZ(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::NullShape => MultiPolygon(vec![]),
            other => {
                let reason = format!("feature {n} is a {:?}, only polygon layers are supported", other.shapetype());
                return Err(AreaWeightError::data_source(path, reason).into());
            }
        };

        builder.push(geometry, record.into_iter().map(|(name, value)| (name, field_value(value))));
    }

    Ok(builder.build())
}

/// Resolve the sidecar `.prj`, if any.
fn read_prj(path: &Path) -> Option<SpatialRef> {
    let prj = path.with_extension("prj");
    let wkt = fs::read_to_string(&prj).ok()?;
    let srs = SpatialRef::from_wkt(&wkt);
    if srs.is_none() {
        warn!(prj = %prj.display(), "unrecognised .prj definition, spatial reference unknown");
    }
    srs
}

/// Convert a dBase value into a [`FieldValue`].
fn field_value(value: dbase::FieldValue) -> FieldValue {
    match value {
        dbase::FieldValue::Character(Some(s)) => FieldValue::Text(s.trim_end().to_string()),
        dbase::FieldValue::Memo(s) => FieldValue::Text(s),
        dbase::FieldValue::Numeric(Some(n)) | dbase::FieldValue::Double(n) | dbase::FieldValue::Currency(n) => FieldValue::Number(n),
        dbase::FieldValue::Float(Some(f)) => FieldValue::Number(f as f64),
        dbase::FieldValue::Integer(i) => FieldValue::Integer(i as i64),
        dbase::FieldValue::Logical(Some(b)) => FieldValue::Text(b.to_string()),
        _ => FieldValue::Null,
    }
}

/// Group Shapefile rings into polygons: each outer ring owns the inner rings that follow it.
///
/// An inner ring with no preceding outer ring is kept as an exterior.
pub(crate) fn rings_to_geo<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
    let to_line = |points: &[P]| {
        let mut coords = points.iter().map(&xy).collect::<Vec<_>>();
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }
        LineString(coords)
    };

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => {
                if let Some(ext) = exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(to_line(points));
            }
            PolygonRing::Inner(points) if exterior.is_some() => holes.push(to_line(points)),
            PolygonRing::Inner(points) => exterior = Some(to_line(points)),
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

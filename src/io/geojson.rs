use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};

use crate::error::AreaWeightError;
use crate::geom::SpatialRef;
use crate::layer::{FieldValue, VectorLayer};

/// Read a GeoJSON FeatureCollection of polygons from `path`.
pub(crate) fn read_geojson(path: &Path) -> Result<VectorLayer> {
    let text = fs::read_to_string(path)
        .map_err(|e| AreaWeightError::data_source(path, format!("failed to read file: {e}")))?;
    parse_geojson(&text)
        .map_err(|e| AreaWeightError::data_source(path, format!("{e:#}")).into())
}

/// Parse a GeoJSON FeatureCollection of Polygon/MultiPolygon features.
///
/// Without a `crs` member the layer is EPSG:4326, as RFC 7946 prescribes.
pub fn parse_geojson(text: &str) -> Result<VectorLayer> {
    let root: Value = serde_json::from_str(text).context("[io::geojson] invalid JSON")?;

    match root.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        Some(other) => bail!("[io::geojson] expected a FeatureCollection, found {other}"),
        None => bail!("[io::geojson] missing \"type\" member"),
    }

    let srs = match root.pointer("/crs/properties/name").and_then(Value::as_str) {
        Some(name) => SpatialRef::from_urn(name)?,
        None => SpatialRef::from_epsg(4326)?,
    };

    let features = root.get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("[io::geojson] missing \"features\" array"))?;

    let mut builder = VectorLayer::builder().spatial_ref(Some(srs));
    for (i, feature) in features.iter().enumerate() {
        let geometry = match feature.get("geometry") {
            None | Some(Value::Null) => MultiPolygon(vec![]),
            Some(geometry) => parse_geometry(geometry)
                .with_context(|| format!("[io::geojson] feature {i}"))?,
        };

        let empty = Map::new();
        let properties = match feature.get("properties") {
            Some(Value::Object(properties)) => properties,
            _ => &empty,
        };

        builder.push(geometry, properties.iter().map(|(name, value)| (name, field_value(value))));
    }

    Ok(builder.build())
}

fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>> {
    let coordinates = geometry.get("coordinates")
        .ok_or_else(|| anyhow!("geometry has no coordinates"))?;

    match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon(coordinates)?])),
        Some("MultiPolygon") => Ok(MultiPolygon(
            as_array(coordinates)?.iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?
        )),
        Some(other) => bail!("{other} geometries are not supported, only Polygon and MultiPolygon"),
        None => bail!("geometry has no type"),
    }
}

fn parse_polygon(rings: &Value) -> Result<Polygon<f64>> {
    let mut rings = as_array(rings)?.iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?
        .into_iter();

    let exterior = rings.next().unwrap_or_else(|| LineString(vec![]));
    Ok(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    as_array(ring)?.iter()
        .map(|position| {
            match as_array(position)?.as_slice() {
                [x, y, ..] => Ok(Coord {
                    x: x.as_f64().ok_or_else(|| anyhow!("non-numeric coordinate {x}"))?,
                    y: y.as_f64().ok_or_else(|| anyhow!("non-numeric coordinate {y}"))?,
                }),
                _ => bail!("position needs at least two coordinates: {position}"),
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString)
}

#[inline]
fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("expected an array, found {value}"))
}

/// Convert a JSON property into a [`FieldValue`].
fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => FieldValue::Text(s.clone()),
        other => FieldValue::Text(other.to_string()),
    }
}

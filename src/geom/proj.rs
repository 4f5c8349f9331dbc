use std::{fmt, sync::LazyLock};

use anyhow::{Context, Result};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use regex::Regex;
use tracing::warn;

use crate::error::AreaWeightError;
use super::PolygonGeometry;

/// `AUTHORITY["EPSG","26915"]`, in WKT1 the outermost one comes last.
static WKT_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"AUTHORITY\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#).unwrap()
});

/// ESRI-style projected names, e.g. `NAD_1983_UTM_Zone_15N`.
static WKT_UTM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^PROJCS\["(WGS_1984|NAD_1983)_UTM_Zone_(\d{1,2})([NS])""#).unwrap()
});

/// A coordinate reference system, held as a PROJ.4 definition.
#[derive(Debug, Clone)]
pub struct SpatialRef {
    definition: String,
    epsg: Option<u32>,
}

impl SpatialRef {
    /// Resolve an EPSG code from the built-in table.
    pub fn from_epsg(code: u32) -> Result<Self> {
        let definition = epsg_proj4(code).ok_or_else(|| {
            AreaWeightError::Projection(format!("EPSG:{code} is not in the built-in CRS table"))
        })?;
        Ok(Self { definition, epsg: Some(code) })
    }

    /// Parse user text: `EPSG:<code>` or a raw PROJ.4 string.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some(code) = text.strip_prefix("EPSG:").or_else(|| text.strip_prefix("epsg:")) {
            let code = code.trim().parse::<u32>()
                .map_err(|_| AreaWeightError::Projection(format!("invalid EPSG code in '{text}'")))?;
            return Self::from_epsg(code);
        }
        if text.split_whitespace().any(|token| token.starts_with("+proj=")) {
            return Ok(Self { definition: text.to_string(), epsg: None });
        }
        Err(AreaWeightError::Projection(format!("unrecognised CRS '{text}' (expected EPSG:<code> or +proj=...)")).into())
    }

    /// Resolve a GeoJSON `crs.properties.name` value.
    pub fn from_urn(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.ends_with("CRS84") {
            return Self::from_epsg(4326);
        }
        match name.rsplit(':').next().and_then(|code| code.parse::<u32>().ok()) {
            Some(code) if name.to_ascii_uppercase().contains("EPSG") => Self::from_epsg(code),
            _ => Err(AreaWeightError::Projection(format!("unrecognised CRS name '{name}'")).into()),
        }
    }

    /// Best-effort resolution of a WKT (`.prj`) definition, `None` if not recognised.
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let wkt = wkt.trim();
        if let Some(code) = WKT_AUTHORITY.captures_iter(wkt).last()
            .and_then(|caps| caps[1].parse::<u32>().ok())
        {
            return Self::from_epsg(code).ok();
        }

        if let Some(caps) = WKT_UTM_NAME.captures(wkt) {
            let zone = caps[2].parse::<u32>().ok()?;
            let code = match (&caps[1], &caps[3]) {
                ("NAD_1983", "N") => 26900 + zone,
                ("WGS_1984", "N") => 32600 + zone,
                ("WGS_1984", "S") => 32700 + zone,
                _ => return None,
            };
            return Self::from_epsg(code).ok();
        }

        if wkt.starts_with("PROJCS[\"WGS_1984_Web_Mercator") {
            return Self::from_epsg(3857).ok();
        }
        if wkt.starts_with("GEOGCS[") {
            if wkt.contains("North_American_1983") { return Self::from_epsg(4269).ok() }
            if wkt.contains("WGS_1984") || wkt.contains("WGS 84") { return Self::from_epsg(4326).ok() }
        }
        None
    }

    /// The PROJ.4 definition.
    #[inline] pub fn definition(&self) -> &str { &self.definition }

    /// The EPSG code, if this reference came from one.
    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    /// True for lon/lat systems (coordinates in degrees).
    pub fn is_geographic(&self) -> bool {
        self.definition.split_whitespace()
            .any(|token| matches!(token, "+proj=longlat" | "+proj=latlong" | "+proj=lonlat" | "+proj=latlon"))
    }

    /// Definition tokens with ordering and no-op flags removed.
    fn normalized(&self) -> Vec<&str> {
        let mut tokens = self.definition.split_whitespace()
            .filter(|token| !matches!(*token, "+no_defs" | "+type=crs" | "+wktext"))
            .collect::<Vec<_>>();
        tokens.sort_unstable();
        tokens
    }
}

impl PartialEq for SpatialRef {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg {
            Some(code) => write!(f, "EPSG:{code}"),
            None => f.write_str(&self.definition),
        }
    }
}

/// PROJ.4 definitions for the EPSG codes this tool knows about.
fn epsg_proj4(code: u32) -> Option<String> {
    let definition = match code {
        4326 => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
        4269 => "+proj=longlat +datum=NAD83 +no_defs".to_string(),
        4267 => "+proj=longlat +ellps=clrk66 +towgs84=-8,160,176,0,0,0,0 +no_defs".to_string(),
        3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs".to_string(),
        5070 => "+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +datum=NAD83 +units=m +no_defs".to_string(),
        26901..=26923 => format!("+proj=utm +zone={} +datum=NAD83 +units=m +no_defs", code - 26900),
        32601..=32660 => format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", code - 32600),
        32701..=32760 => format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs", code - 32700),
        _ => return None,
    };
    Some(definition)
}

/// Moves coordinates from one spatial reference into another.
pub struct CrsTransform {
    from: Proj4,
    to: Proj4,
    from_geographic: bool,
    to_geographic: bool,
    label: String,
}

impl CrsTransform {
    pub fn new(from: &SpatialRef, to: &SpatialRef) -> Result<Self> {
        let build = |srs: &SpatialRef| {
            Proj4::from_proj_string(srs.definition())
                .map_err(|e| AreaWeightError::Projection(format!("failed to build PROJ.4 '{}': {e:?}", srs.definition())))
        };

        Ok(Self {
            from: build(from)?,
            to: build(to)?,
            from_geographic: from.is_geographic(),
            to_geographic: to.is_geographic(),
            label: format!("{from} -> {to}"),
        })
    }

    /// Transform a single coordinate pair (degrees in/out for geographic systems).
    pub fn apply_xy(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut point = if self.from_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&self.from, &self.to, &mut point)
            .map_err(|e| AreaWeightError::Projection(format!("{}: cannot transform ({x}, {y}): {e:?}", self.label)))?;

        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(AreaWeightError::Projection(format!("{}: ({x}, {y}) maps to a non-finite coordinate", self.label)).into());
        }

        Ok(if self.to_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        })
    }

    /// Transform every vertex of `geometry`.
    pub fn apply<G: PolygonGeometry>(&self, geometry: &G) -> Result<G> {
        geometry.try_map_xy(|x, y| self.apply_xy(x, y))
            .with_context(|| format!("[geom::proj] Failed to re-project geometry ({})", self.label))
    }
}

impl fmt::Debug for CrsTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrsTransform").field("label", &self.label).finish()
    }
}

/// Build the transform that moves to-layer geometries into the from-layer CRS.
///
/// Returns `None` when both layers share a CRS, or when either CRS is unknown.
pub fn layer_transform(from: Option<&SpatialRef>, to: Option<&SpatialRef>) -> Result<Option<CrsTransform>> {
    match (from, to) {
        (Some(from), Some(to)) if from == to => Ok(None),
        (Some(from), Some(to)) => Ok(Some(CrsTransform::new(to, from)?)),
        (None, None) => Ok(None),
        (from, to) => {
            warn!(
                from = %from.map_or("unknown".to_string(), |s| s.to_string()),
                to = %to.map_or("unknown".to_string(), |s| s.to_string()),
                "spatial reference of one layer is unknown, assuming both layers share a CRS"
            );
            Ok(None)
        }
    }
}

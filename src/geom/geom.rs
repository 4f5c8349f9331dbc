use anyhow::Result;
use geo::{Area, BooleanOps, BoundingRect, Buffer, Coord, MapCoords, MultiPolygon, Rect};

/// The geometry operations area weighting needs from a polygon engine.
///
/// The weighting loop is written against this trait only, so a different
/// engine can be plugged in by implementing it for its polygon type.
pub trait PolygonGeometry: Clone {
    /// Exact intersection with `other`.
    fn intersect(&self, other: &Self) -> Self;

    /// Unsigned planar area, in squared CRS units.
    fn area(&self) -> f64;

    /// Geometry grown (or shrunk, for negative `distance`) by `distance` CRS units.
    fn buffered(&self, distance: f64) -> Self;

    /// Axis-aligned bounding rectangle, `None` for empty geometries.
    fn envelope(&self) -> Option<Rect<f64>>;

    /// Map every vertex through `f`, stopping at the first error.
    fn try_map_xy<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> Result<(f64, f64)>;
}

impl PolygonGeometry for MultiPolygon<f64> {
    #[inline]
    fn intersect(&self, other: &Self) -> Self {
        BooleanOps::intersection(self, other)
    }

    #[inline]
    fn area(&self) -> f64 { self.unsigned_area() }

    #[inline]
    fn buffered(&self, distance: f64) -> Self {
        Buffer::buffer(self, distance)
    }

    #[inline]
    fn envelope(&self) -> Option<Rect<f64>> { self.bounding_rect() }

    fn try_map_xy<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> Result<(f64, f64)>,
    {
        self.try_map_coords(|coord: Coord<f64>| {
            let (x, y) = f(coord.x, coord.y)?;
            Ok(Coord { x, y })
        })
    }
}

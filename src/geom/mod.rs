//! Geometry decoding (EWKB) and MVT command-buffer encoding.

pub mod encode;
pub mod ewkb;

pub type Coord = (f64, f64);

/// Closed sum type over the geometry shapes the builder understands.
/// Anything else decoded from EWKB is reported as `Unsupported` and the
/// row producing it is skipped by the builder, not treated as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

/// MVT feature geometry type enum (mirrors the wire format's `GeomType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomType {
    Point,
    LineString,
    Polygon,
}

impl Geometry {
    pub fn mvt_type(&self) -> GeomType {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => GeomType::Point,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => GeomType::LineString,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => GeomType::Polygon,
        }
    }
}

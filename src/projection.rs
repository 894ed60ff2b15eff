//! Tile address <-> Web Mercator projection.
//!
//! Mirrors `original_source/geo/geo.go`: compute the lon/lat corners of a
//! tile with the standard slippy-map formulas, then project to EPSG:3857
//! metres, inverting Y since tile rows increase downward but Mercator Y
//! increases northward.

use crate::error::{Error, Result};
use std::f64::consts::PI;

const EARTH_RADIUS_METERS: f64 = 20037508.342789244;

/// Axis-aligned bounding box in a given spatial reference system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub srid: i32,
}

impl BBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Box padded by 5% of width/height on each side, per the query
    /// padding rule; the box used for coordinate transforms stays unpadded.
    pub fn padded(&self, fraction: f64) -> BBox {
        let bx = self.width() * fraction;
        let by = self.height() * fraction;
        BBox {
            min_x: self.min_x - bx,
            min_y: self.min_y - by,
            max_x: self.max_x + bx,
            max_y: self.max_y + by,
            srid: self.srid,
        }
    }
}

fn lon_lat(x: f64, y: f64, z: u32) -> (f64, f64) {
    let n = PI - 2.0 * PI * y / 2f64.powi(z as i32);
    let lat = (180.0 / PI) * (0.5 * (n.exp() - (-n).exp())).atan();
    let lon = x / 2f64.powi(z as i32) * 360.0 - 180.0;
    (lon, lat)
}

fn merc(lon: f64, lat: f64) -> Result<(f64, f64)> {
    if lon.abs() > 180.0 {
        return Err(Error::InvalidCoordinate(format!(
            "longitude {lon} out of range"
        )));
    }
    if lat.abs() > 90.0 {
        return Err(Error::InvalidCoordinate(format!(
            "latitude {lat} out of range"
        )));
    }
    let x = lon * EARTH_RADIUS_METERS / 180.0;
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() * EARTH_RADIUS_METERS / PI;
    Ok((x, y))
}

/// Bounding box in EPSG:3857 for tile (z, x, y).
///
/// x and y must satisfy `0 <= x,y < 2^z`; callers at the service boundary
/// are responsible for rejecting out-of-range addresses before calling
/// this (see the tile route), so a degenerate box never reaches the
/// builder.
pub fn tile_to_bbox(z: u32, x: u32, y: u32) -> Result<BBox> {
    let (lon_w, lat_n) = lon_lat(x as f64, y as f64, z);
    let (lon_e, lat_s) = lon_lat((x + 1) as f64, (y + 1) as f64, z);

    let (min_x, _) = merc(lon_w, lat_s)?;
    let (max_x, _) = merc(lon_e, lat_n)?;
    let (_, max_y) = merc(lon_e, lat_n)?;
    let (_, min_y) = merc(lon_w, lat_s)?;

    Ok(BBox {
        min_x,
        min_y,
        max_x,
        max_y,
        srid: 3857,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_bounds_at_zoom_zero() {
        let b = tile_to_bbox(0, 0, 0).unwrap();
        assert!((b.min_x + EARTH_RADIUS_METERS).abs() < 0.01);
        assert!((b.min_y + EARTH_RADIUS_METERS).abs() < 0.01);
        assert!((b.max_x - EARTH_RADIUS_METERS).abs() < 0.01);
        assert!((b.max_y - EARTH_RADIUS_METERS).abs() < 0.01);
    }

    #[test]
    fn tiles_are_square() {
        for &(z, x, y) in &[(1, 0, 0), (3, 5, 2), (8, 120, 90)] {
            let b = tile_to_bbox(z, x, y).unwrap();
            assert!((b.width() - b.height()).abs() < 1e-6, "z{z}/{x}/{y}");
        }
    }

    #[test]
    fn adjacent_tiles_share_an_edge() {
        let a = tile_to_bbox(4, 3, 2).unwrap();
        let b = tile_to_bbox(4, 4, 2).unwrap();
        assert!((a.max_x - b.min_x).abs() < 1e-6);
    }

    #[test]
    fn padded_box_keeps_center() {
        let b = BBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 20.0,
            srid: 3857,
        };
        let p = b.padded(0.05);
        assert!((p.min_x - (-0.5)).abs() < 1e-9);
        assert!((p.max_x - 10.5).abs() < 1e-9);
        assert!((p.min_y - (-1.0)).abs() < 1e-9);
        assert!((p.max_y - 21.0).abs() < 1e-9);
    }
}

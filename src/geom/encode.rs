//! Geometry -> MVT command-buffer encoding.
//!
//! Command/coordinate layout matches `original_source/data/data.go`'s
//! `readPoint`/`readLinestring`/`readPolygon`/`readMultiLinestring`/
//! `readMultiPolygon` family, with one deliberate fix: `readMultiPoint`
//! there overwrites `feature.Geometry` on every loop iteration, keeping
//! only the last point. This implementation instead emits a single
//! `MoveTo(n)` followed by all `n` delta pairs, per the MVT 2.1
//! specification (see DESIGN.md Open Question 1).

use super::Geometry;
use crate::projection::BBox;

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

fn command(id: u32, count: u32) -> u32 {
    (id & 0x7) | (count << 3)
}

fn zigzag(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Tracks the running cursor position across an entire feature; deltas
/// are taken against the previous emitted point, persisting across rings
/// and components (Open Question 3: not reset per ring).
struct Cursor {
    x: i32,
    y: i32,
}

impl Cursor {
    fn new() -> Self {
        Cursor { x: 0, y: 0 }
    }

    fn advance(&mut self, x: i32, y: i32) -> (u32, u32) {
        let (dx, dy) = (x - self.x, y - self.y);
        self.x = x;
        self.y = y;
        (zigzag(dx), zigzag(dy))
    }
}

struct Transform {
    min_x: f64,
    min_y: f64,
    width_scale: f64,
    height_scale: f64,
}

impl Transform {
    fn tile_coord(&self, gx: f64, gy: f64) -> (i32, i32) {
        let x = ((gx - self.min_x) * self.width_scale).floor() as i32;
        let y = ((gy - self.min_y) * self.height_scale).floor() as i32;
        (x, y)
    }
}

fn width_height_scale(bbox: &BBox) -> (f64, f64) {
    (4096.0 / bbox.width(), 4096.0 / bbox.height())
}

/// Encode a decoded geometry into an MVT command buffer, given the
/// (unpadded) request bbox used for the coordinate transform.
pub fn encode(geom: &Geometry, bbox: &BBox) -> Vec<u32> {
    let (width_scale, height_scale) = width_height_scale(bbox);
    let t = Transform {
        min_x: bbox.min_x,
        min_y: bbox.min_y,
        width_scale,
        height_scale,
    };
    let mut cursor = Cursor::new();
    let mut out = Vec::new();

    match geom {
        Geometry::Point(p) => encode_point(&mut out, &mut cursor, &t, *p),
        Geometry::MultiPoint(pts) => encode_multipoint(&mut out, &mut cursor, &t, pts),
        Geometry::LineString(pts) => encode_linestring(&mut out, &mut cursor, &t, pts),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                encode_linestring(&mut out, &mut cursor, &t, line);
            }
        }
        Geometry::Polygon(rings) => encode_polygon(&mut out, &mut cursor, &t, rings),
        Geometry::MultiPolygon(polys) => {
            for rings in polys {
                encode_polygon(&mut out, &mut cursor, &t, rings);
            }
        }
    }
    out
}

fn encode_point(out: &mut Vec<u32>, cursor: &mut Cursor, t: &Transform, p: (f64, f64)) {
    out.push(command(CMD_MOVE_TO, 1));
    let (x, y) = t.tile_coord(p.0, p.1);
    let (dx, dy) = cursor.advance(x, y);
    out.push(dx);
    out.push(dy);
}

fn encode_multipoint(out: &mut Vec<u32>, cursor: &mut Cursor, t: &Transform, pts: &[(f64, f64)]) {
    if pts.is_empty() {
        return;
    }
    out.push(command(CMD_MOVE_TO, pts.len() as u32));
    for &(gx, gy) in pts {
        let (x, y) = t.tile_coord(gx, gy);
        let (dx, dy) = cursor.advance(x, y);
        out.push(dx);
        out.push(dy);
    }
}

fn encode_linestring(out: &mut Vec<u32>, cursor: &mut Cursor, t: &Transform, pts: &[(f64, f64)]) {
    if pts.len() < 2 {
        return;
    }
    let (x0, y0) = t.tile_coord(pts[0].0, pts[0].1);
    out.push(command(CMD_MOVE_TO, 1));
    let (dx0, dy0) = cursor.advance(x0, y0);
    out.push(dx0);
    out.push(dy0);

    out.push(command(CMD_LINE_TO, (pts.len() - 1) as u32));
    for &(gx, gy) in &pts[1..] {
        let (x, y) = t.tile_coord(gx, gy);
        let (dx, dy) = cursor.advance(x, y);
        out.push(dx);
        out.push(dy);
    }
}

fn encode_polygon(out: &mut Vec<u32>, cursor: &mut Cursor, t: &Transform, rings: &[Vec<(f64, f64)>]) {
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let (x0, y0) = t.tile_coord(ring[0].0, ring[0].1);
        out.push(command(CMD_MOVE_TO, 1));
        let (dx0, dy0) = cursor.advance(x0, y0);
        out.push(dx0);
        out.push(dy0);

        // The ring's closing point repeats the first in source form and
        // is not re-emitted (ClosePath implies it).
        let body = &ring[1..ring.len() - 1];
        out.push(command(CMD_LINE_TO, body.len() as u32));
        for &(gx, gy) in body {
            let (x, y) = t.tile_coord(gx, gy);
            let (dx, dy) = cursor.advance(x, y);
            out.push(dx);
            out.push(dy);
        }
        out.push(command(CMD_CLOSE_PATH, 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bbox() -> BBox {
        BBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 4096.0,
            max_y: 4096.0,
            srid: 3857,
        }
    }

    #[test]
    fn point_matches_spec_vector() {
        let g = Geometry::Point((25.0, 17.0));
        assert_eq!(encode(&g, &unit_bbox()), vec![9, 50, 34]);
    }

    #[test]
    fn linestring_matches_spec_vector() {
        let g = Geometry::LineString(vec![(2.0, 2.0), (2.0, 10.0), (10.0, 10.0)]);
        assert_eq!(
            encode(&g, &unit_bbox()),
            vec![9, 4, 4, 18, 0, 16, 16, 0]
        );
    }

    #[test]
    fn polygon_matches_spec_vector() {
        let g = Geometry::Polygon(vec![vec![
            (3.0, 6.0),
            (8.0, 12.0),
            (20.0, 34.0),
            (3.0, 6.0),
        ]]);
        assert_eq!(
            encode(&g, &unit_bbox()),
            vec![9, 6, 12, 18, 10, 12, 24, 44, 15]
        );
    }

    #[test]
    fn multipoint_emits_single_moveto_with_all_points() {
        let g = Geometry::MultiPoint(vec![(5.0, 7.0), (3.0, 2.0)]);
        let buf = encode(&g, &unit_bbox());
        assert_eq!(buf[0], command(CMD_MOVE_TO, 2));
        assert_eq!(buf.len(), 1 + 2 * 2);
    }
}

//! (E)WKB geometry decoding.
//!
//! Hand-rolled rather than pulled from a crate: the decoded shape is a
//! small closed set (see `geom::Geometry`) and the wire format is a fixed,
//! self-describing binary layout (`original_source/data/data.go` decodes
//! it the same way, via `ewkb.Decode` over the raw column bytes). Only
//! byte-order-aware primitive reads come from a crate (`byteorder`);
//! nested-geometry traversal is ours.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

use super::{Coord, Geometry};

const SRID_FLAG: u32 = 0x2000_0000;
const Z_FLAG: u32 = 0x8000_0000;
const M_FLAG: u32 = 0x4000_0000;

pub fn decode(bytes: &[u8]) -> Result<Geometry> {
    let mut cur = Cursor::new(bytes);
    decode_one(&mut cur)
}

fn decode_one(cur: &mut Cursor<&[u8]>) -> Result<Geometry> {
    let order = cur
        .read_u8()
        .map_err(|e| Error::GeometryDecode(e.to_string()))?;
    if order == 1 {
        decode_body::<LittleEndian>(cur)
    } else {
        decode_body::<BigEndian>(cur)
    }
}

fn decode_body<E: ByteOrder>(cur: &mut Cursor<&[u8]>) -> Result<Geometry> {
    let raw_type = cur
        .read_u32::<E>()
        .map_err(|e| Error::GeometryDecode(e.to_string()))?;
    if raw_type & SRID_FLAG != 0 {
        cur.read_u32::<E>()
            .map_err(|e| Error::GeometryDecode(e.to_string()))?;
    }
    let extra_dims = (raw_type & Z_FLAG != 0) as usize + (raw_type & M_FLAG != 0) as usize;
    let base = raw_type & 0xff;

    match base {
        1 => Ok(Geometry::Point(read_coord::<E>(cur, extra_dims)?)),
        2 => Ok(Geometry::LineString(read_points::<E>(cur, extra_dims)?)),
        3 => Ok(Geometry::Polygon(read_rings::<E>(cur, extra_dims)?)),
        4 => {
            let n = read_count::<E>(cur)?;
            let mut pts = Vec::with_capacity(n);
            for _ in 0..n {
                match decode_one(cur)? {
                    Geometry::Point(c) => pts.push(c),
                    other => {
                        return Err(Error::GeometryDecode(format!(
                            "expected point in multipoint, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Geometry::MultiPoint(pts))
        }
        5 => {
            let n = read_count::<E>(cur)?;
            let mut lines = Vec::with_capacity(n);
            for _ in 0..n {
                match decode_one(cur)? {
                    Geometry::LineString(pts) => lines.push(pts),
                    other => {
                        return Err(Error::GeometryDecode(format!(
                            "expected linestring in multilinestring, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Geometry::MultiLineString(lines))
        }
        6 => {
            let n = read_count::<E>(cur)?;
            let mut polys = Vec::with_capacity(n);
            for _ in 0..n {
                match decode_one(cur)? {
                    Geometry::Polygon(rings) => polys.push(rings),
                    other => {
                        return Err(Error::GeometryDecode(format!(
                            "expected polygon in multipolygon, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Geometry::MultiPolygon(polys))
        }
        other => Err(Error::GeometryDecode(format!(
            "unsupported geometry type {other}"
        ))),
    }
}

fn read_count<E: ByteOrder>(cur: &mut Cursor<&[u8]>) -> Result<usize> {
    cur.read_u32::<E>()
        .map(|n| n as usize)
        .map_err(|e| Error::GeometryDecode(e.to_string()))
}

fn read_coord<E: ByteOrder>(cur: &mut Cursor<&[u8]>, extra_dims: usize) -> Result<Coord> {
    let x = cur
        .read_f64::<E>()
        .map_err(|e| Error::GeometryDecode(e.to_string()))?;
    let y = cur
        .read_f64::<E>()
        .map_err(|e| Error::GeometryDecode(e.to_string()))?;
    for _ in 0..extra_dims {
        cur.read_f64::<E>()
            .map_err(|e| Error::GeometryDecode(e.to_string()))?;
    }
    Ok((x, y))
}

fn read_points<E: ByteOrder>(cur: &mut Cursor<&[u8]>, extra_dims: usize) -> Result<Vec<Coord>> {
    let n = read_count::<E>(cur)?;
    (0..n).map(|_| read_coord::<E>(cur, extra_dims)).collect()
}

fn read_rings<E: ByteOrder>(cur: &mut Cursor<&[u8]>, extra_dims: usize) -> Result<Vec<Vec<Coord>>> {
    let n = read_count::<E>(cur)?;
    (0..n).map(|_| read_points::<E>(cur, extra_dims)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_point(x: f64, y: f64) -> Vec<u8> {
        let mut buf = vec![1u8];
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_little_endian_point() {
        let bytes = le_point(1.5, -2.5);
        assert_eq!(decode(&bytes).unwrap(), Geometry::Point((1.5, -2.5)));
    }

    #[test]
    fn decodes_linestring() {
        let mut buf = vec![1u8];
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&0f64.to_le_bytes());
        buf.extend_from_slice(&0f64.to_le_bytes());
        buf.extend_from_slice(&1f64.to_le_bytes());
        buf.extend_from_slice(&1f64.to_le_bytes());
        assert_eq!(
            decode(&buf).unwrap(),
            Geometry::LineString(vec![(0.0, 0.0), (1.0, 1.0)])
        );
    }

    #[test]
    fn decodes_multipoint_of_embedded_points() {
        let mut buf = vec![1u8];
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend(le_point(1.0, 2.0));
        buf.extend(le_point(3.0, 4.0));
        assert_eq!(
            decode(&buf).unwrap(),
            Geometry::MultiPoint(vec![(1.0, 2.0), (3.0, 4.0)])
        );
    }

    #[test]
    fn rejects_unsupported_type() {
        let mut buf = vec![1u8];
        buf.extend_from_slice(&7u32.to_le_bytes());
        assert!(decode(&buf).is_err());
    }

    #[test]
    fn skips_srid_and_z_flags() {
        let mut buf = vec![1u8];
        let raw_type = 1u32 | SRID_FLAG | Z_FLAG;
        buf.extend_from_slice(&raw_type.to_le_bytes());
        buf.extend_from_slice(&4326u32.to_le_bytes());
        buf.extend_from_slice(&1.0f64.to_le_bytes());
        buf.extend_from_slice(&2.0f64.to_le_bytes());
        buf.extend_from_slice(&3.0f64.to_le_bytes());
        assert_eq!(decode(&buf).unwrap(), Geometry::Point((1.0, 2.0)));
    }
}

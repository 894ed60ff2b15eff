//! MVT protobuf wire serialization.
//!
//! Hand-rolled varint/tag writer rather than a generated-protobuf crate:
//! the Mapbox Vector Tile schema is small, fixed, and versioned as part
//! of the wire contract itself (see SPEC_FULL.md §4.6), so there is no
//! `.proto` surface that benefits from codegen here, and depending on a
//! generated-code crate would mean guessing field names never seen in
//! this pack. Field numbers below follow the published `vector_tile.proto`.

use super::value::Value;
use super::{Feature, Layer, Tile};

const WT_VARINT: u64 = 0;
const WT_64BIT: u64 = 1;
const WT_LEN: u64 = 2;
const WT_32BIT: u64 = 5;

fn write_varint(buf: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            buf.push(byte | 0x80);
        } else {
            buf.push(byte);
            break;
        }
    }
}

fn write_tag(buf: &mut Vec<u8>, field: u32, wire_type: u64) {
    write_varint(buf, ((field as u64) << 3) | wire_type);
}

fn write_varint_field(buf: &mut Vec<u8>, field: u32, v: u64) {
    write_tag(buf, field, WT_VARINT);
    write_varint(buf, v);
}

fn write_fixed32_field(buf: &mut Vec<u8>, field: u32, v: u32) {
    write_tag(buf, field, WT_32BIT);
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_fixed64_field(buf: &mut Vec<u8>, field: u32, v: u64) {
    write_tag(buf, field, WT_64BIT);
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_bytes_field(buf: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    write_tag(buf, field, WT_LEN);
    write_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn write_string_field(buf: &mut Vec<u8>, field: u32, s: &str) {
    write_bytes_field(buf, field, s.as_bytes());
}

fn write_packed_varint_field(buf: &mut Vec<u8>, field: u32, items: &[u32]) {
    let mut inner = Vec::new();
    for &i in items {
        write_varint(&mut inner, i as u64);
    }
    write_bytes_field(buf, field, &inner);
}

fn encode_value(v: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    match v {
        Value::String(s) => write_string_field(&mut buf, 1, s),
        Value::Float(f) => write_fixed32_field(&mut buf, 2, f.to_bits()),
        Value::Double(d) => write_fixed64_field(&mut buf, 3, d.to_bits()),
        Value::Int(i) => write_varint_field(&mut buf, 4, *i as u64),
        Value::UInt(u) => write_varint_field(&mut buf, 5, *u),
        Value::Bool(b) => write_varint_field(&mut buf, 7, *b as u64),
    }
    buf
}

fn encode_feature(f: &Feature) -> Vec<u8> {
    let mut buf = Vec::new();
    write_packed_varint_field(&mut buf, 2, &f.tags);
    write_varint_field(&mut buf, 3, f.geom_type as u64);
    write_packed_varint_field(&mut buf, 4, &f.geometry);
    buf
}

fn encode_layer(l: &Layer) -> Vec<u8> {
    let mut buf = Vec::new();
    write_string_field(&mut buf, 1, &l.name);
    for f in &l.features {
        write_bytes_field(&mut buf, 2, &encode_feature(f));
    }
    for k in &l.keys {
        write_string_field(&mut buf, 3, k);
    }
    for v in &l.values {
        write_bytes_field(&mut buf, 4, &encode_value(v));
    }
    write_varint_field(&mut buf, 5, l.extent as u64);
    write_varint_field(&mut buf, 15, l.version as u64);
    buf
}

/// Serialize a whole tile to its final MVT byte payload.
pub fn encode_tile(tile: &Tile) -> Vec<u8> {
    let mut buf = Vec::new();
    for l in &tile.layers {
        write_bytes_field(&mut buf, 3, &encode_layer(l));
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_round_trips_multi_byte() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 300);
        assert_eq!(buf, vec![0xac, 0x02]);
    }

    #[test]
    fn empty_layer_encodes_required_fields_only() {
        let tile = Tile {
            layers: vec![Layer {
                version: 2,
                name: "places".into(),
                extent: 4096,
                features: vec![],
                keys: vec![],
                values: vec![],
            }],
        };
        let bytes = encode_tile(&tile);
        assert!(!bytes.is_empty());
        // layer field (3, LEN) tag byte is 0x1a
        assert_eq!(bytes[0], 0x1a);
    }
}

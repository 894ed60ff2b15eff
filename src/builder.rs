//! Tile builder: per-request orchestration of query, geometry transform,
//! and tag interning.
//!
//! Per-layer pipeline matches `original_source/data/data.go`'s
//! `readLayer`: pad the bbox by 5%, query with the padded box, decode
//! each row's geometry, skip unsupported shapes (warn, don't fail the
//! layer), and intern attribute values into the layer's key/value tables.

use log::{debug, warn};
use postgres::types::Type;
use postgres::Row;

use crate::db::Pool;
use crate::error::{Error, Result};
use crate::geom::ewkb;
use crate::mvt::value::{KeyTable, Value, ValueTable};
use crate::mvt::{Feature, Layer, Tile};
use crate::projection::BBox;
use crate::registry::{LayerDef, Registry};

const PADDING_FRACTION: f64 = 0.05;

pub struct Builder {
    pool: Pool,
    registry: Registry,
}

impl Builder {
    pub fn new(pool: Pool, registry: Registry) -> Self {
        Builder { pool, registry }
    }

    pub fn build(&self, source_name: &str, bbox: &BBox) -> Result<Tile> {
        let layers = self
            .registry
            .layers(source_name)
            .ok_or_else(|| Error::UnknownSource(source_name.to_string()))?;

        let padded = bbox.padded(PADDING_FRACTION);
        let mut conn = self.pool.get()?;

        let mut tile = Tile::new();
        for layer_def in layers {
            tile.layers.push(build_layer(&mut conn, layer_def, bbox, &padded)?);
        }
        Ok(tile)
    }
}

fn build_layer(
    conn: &mut r2d2::PooledConnection<r2d2_postgres::PostgresConnectionManager<postgres::NoTls>>,
    layer_def: &LayerDef,
    bbox: &BBox,
    padded: &BBox,
) -> Result<Layer> {
    debug!(
        "querying layer {:?} bbox=({},{},{},{})",
        layer_def.name, padded.min_x, padded.min_y, padded.max_x, padded.max_y
    );

    let rows = conn.query(
        &layer_def.query_sql,
        &[
            &padded.min_x,
            &padded.min_y,
            &padded.max_x,
            &padded.max_y,
            &bbox.srid,
        ],
    )?;

    let mut keys = KeyTable::new();
    let mut values = ValueTable::new();
    let mut features = Vec::with_capacity(rows.len());

    for row in &rows {
        let geom_bytes: Vec<u8> = row.get(0);
        let geometry = match ewkb::decode(&geom_bytes) {
            Ok(g) => g,
            Err(e) => {
                warn!("skipping row in layer {:?}: {e}", layer_def.name);
                continue;
            }
        };

        let commands = crate::geom::encode::encode(&geometry, bbox);
        let mut tags = Vec::new();

        for (i, column) in layer_def.attribute_columns.iter().enumerate() {
            if column.eq_ignore_ascii_case("geom") || column.eq_ignore_ascii_case("geometry") {
                continue;
            }
            let col_index = i + 1; // column 0 is always the geometry
            match extract_value(&row, col_index) {
                Some(value) => {
                    let k = keys.intern(column);
                    let v = values.intern(value);
                    tags.push(k);
                    tags.push(v);
                }
                None => debug!("null attribute {:?} skipped", column),
            }
        }

        let geom_type = geometry.mvt_type();
        features.push(Feature::new(geom_type, commands, tags));
    }

    let mut layer = Layer::new(layer_def.name.clone());
    layer.features = features;
    layer.keys = keys.into_keys();
    layer.values = values.into_values();
    Ok(layer)
}

fn extract_value(row: &Row, idx: usize) -> Option<Value> {
    match *row.columns()[idx].type_() {
        Type::INT2 => row.get::<_, Option<i16>>(idx).map(|v| Value::Int(v as i64)),
        Type::INT4 => row.get::<_, Option<i32>>(idx).map(|v| Value::Int(v as i64)),
        Type::INT8 => row.get::<_, Option<i64>>(idx).map(Value::Int),
        Type::FLOAT4 => row.get::<_, Option<f32>>(idx).map(Value::Float),
        Type::FLOAT8 => row.get::<_, Option<f64>>(idx).map(Value::Double),
        Type::BOOL => row.get::<_, Option<bool>>(idx).map(Value::Bool),
        Type::VARCHAR | Type::TEXT | Type::BPCHAR => {
            row.get::<_, Option<String>>(idx).map(Value::String)
        }
        Type::VARCHAR_ARRAY | Type::TEXT_ARRAY => row
            .get::<_, Option<Vec<String>>>(idx)
            .map(|v| Value::String(v.join(","))),
        _ => row
            .try_get::<_, Option<String>>(idx)
            .ok()
            .flatten()
            .map(Value::String),
    }
}

//! Assembled MVT tile structure and its wire serialization.

pub mod value;
pub mod wire;

pub use value::Value;

use crate::geom::GeomType;

/// Wire enum values from the published vector_tile.proto GeomType.
fn geom_type_code(t: GeomType) -> u32 {
    match t {
        GeomType::Point => 1,
        GeomType::LineString => 2,
        GeomType::Polygon => 3,
    }
}

pub struct Feature {
    pub geom_type: u32,
    pub geometry: Vec<u32>,
    pub tags: Vec<u32>,
}

impl Feature {
    pub fn new(geom_type: GeomType, geometry: Vec<u32>, tags: Vec<u32>) -> Self {
        Feature {
            geom_type: geom_type_code(geom_type),
            geometry,
            tags,
        }
    }
}

pub struct Layer {
    pub version: u32,
    pub name: String,
    pub extent: u32,
    pub features: Vec<Feature>,
    pub keys: Vec<String>,
    pub values: Vec<Value>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Layer {
            version: 2,
            name: name.into(),
            extent: 4096,
            features: Vec::new(),
            keys: Vec::new(),
            values: Vec::new(),
        }
    }
}

pub struct Tile {
    pub layers: Vec<Layer>,
}

impl Tile {
    pub fn new() -> Self {
        Tile { layers: Vec::new() }
    }

    pub fn encode(&self) -> Vec<u8> {
        wire::encode_tile(self)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new()
    }
}

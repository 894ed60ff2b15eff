//! Per-layer attribute value interning.
//!
//! Grounded on `original_source/data/data.go`'s `values map[interface{}]int`:
//! a dictionary keyed by the raw decoded value, assigning stable
//! first-insertion indices, with `[]string` values joined by `,` before
//! interning. Rust can't key a `HashMap` on an `f64`-bearing enum with
//! `Hash`/`Eq` derives, so equality here is structural and exact (no
//! float-bucketing), which matches the reference's behavior for the
//! finite attribute values a database column can hold.

/// One interned attribute value. Variant names match the wire format's
/// `Value` oneof (string / float32 / float64 / signed/unsigned int64 / bool).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
}

impl Value {
    fn bits_key(&self) -> (u8, u64, String) {
        match self {
            Value::String(s) => (0, 0, s.clone()),
            Value::Float(f) => (1, f.to_bits() as u64, String::new()),
            Value::Double(d) => (2, d.to_bits(), String::new()),
            Value::Int(i) => (3, *i as u64, String::new()),
            Value::UInt(u) => (4, *u, String::new()),
            Value::Bool(b) => (5, *b as u64, String::new()),
        }
    }
}

/// Ordered, deduplicated value table for one layer. `values` is the
/// materialized dense vector used by the encoder; `lookup` is used only
/// to find the index of an already-interned value.
#[derive(Default)]
pub struct ValueTable {
    values: Vec<Value>,
    lookup: std::collections::HashMap<(u8, u64, String), usize>,
}

impl ValueTable {
    pub fn new() -> Self {
        ValueTable::default()
    }

    /// Interns `value`, returning its stable index.
    pub fn intern(&mut self, value: Value) -> u32 {
        let key = value.bits_key();
        if let Some(&idx) = self.lookup.get(&key) {
            return idx as u32;
        }
        let idx = self.values.len();
        self.lookup.insert(key, idx);
        self.values.push(value);
        idx as u32
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Ordered, deduplicated key table for one layer (attribute column names).
#[derive(Default)]
pub struct KeyTable {
    keys: Vec<String>,
    lookup: std::collections::HashMap<String, usize>,
}

impl KeyTable {
    pub fn new() -> Self {
        KeyTable::default()
    }

    pub fn intern(&mut self, key: &str) -> u32 {
        if let Some(&idx) = self.lookup.get(key) {
            return idx as u32;
        }
        let idx = self.keys.len();
        self.lookup.insert(key.to_string(), idx);
        self.keys.push(key.to_string());
        idx as u32
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_value_reuses_index() {
        let mut t = ValueTable::new();
        let a = t.intern(Value::String("park".into()));
        let b = t.intern(Value::String("park".into()));
        assert_eq!(a, b);
        assert_eq!(t.into_values().len(), 1);
    }

    #[test]
    fn distinct_variants_do_not_collapse() {
        let mut t = ValueTable::new();
        let a = t.intern(Value::Int(1));
        let b = t.intern(Value::String("1".into()));
        assert_ne!(a, b);
        assert_eq!(t.into_values().len(), 2);
    }
}

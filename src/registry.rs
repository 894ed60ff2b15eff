//! Layer registry: startup-time schema introspection and SQL composition.
//!
//! Mirrors `original_source/data/data.go`'s `read()` function: query
//! `information_schema.columns` ordered by position, classify each
//! column as an attribute or the geometry column, and fail fast if
//! either is missing, then compose the single parameterized SELECT each
//! layer will run at request time.

use log::{info, warn};
use postgres::NoTls;
use r2d2_postgres::PostgresConnectionManager;

use crate::config::Source;
use crate::db::Pool;
use crate::error::{Error, Result};

// `_text`/`_varchar` are the `udt_name` values Postgres reports for
// `text[]`/`varchar[]` columns; `extract_value` joins them with `,`.
const ATTRIBUTE_UDTS: &[&str] = &[
    "int2", "int4", "int8", "float4", "float8", "bool", "varchar", "text",
    "_varchar", "_text",
];
const GEOMETRY_UDT: &str = "geometry";

#[derive(Debug, Clone)]
pub struct LayerDef {
    pub name: String,
    pub attribute_columns: Vec<String>,
    pub query_sql: String,
}

pub struct Registry {
    sources: std::collections::HashMap<String, Vec<LayerDef>>,
}

impl Registry {
    /// A registry with no sources; used by tests that exercise routing
    /// without a database behind them.
    pub fn empty() -> Registry {
        Registry {
            sources: std::collections::HashMap::new(),
        }
    }

    /// Build the registry by introspecting every configured source/layer
    /// against the database. Fails the whole startup on the first
    /// missing table or geometry column.
    pub fn build(pool: &Pool, schema: &str, sources: &[Source]) -> Result<Registry> {
        let mut conn = pool.get()?;
        let mut built = std::collections::HashMap::new();

        for source in sources {
            let mut layers = Vec::with_capacity(source.layers.len());
            for layer_name in &source.layers {
                let table = format!("{}{}", source.prefix, layer_name);
                let def = introspect_layer(&mut conn, schema, &table, layer_name)?;
                info!(
                    "registered layer {:?} ({} attribute columns) for source {:?}",
                    layer_name,
                    def.attribute_columns.len(),
                    source.name
                );
                layers.push(def);
            }
            built.insert(source.name.clone(), layers);
        }

        Ok(Registry { sources: built })
    }

    pub fn layers(&self, source_name: &str) -> Option<&[LayerDef]> {
        self.sources.get(source_name).map(Vec::as_slice)
    }
}

fn introspect_layer(
    conn: &mut r2d2::PooledConnection<PostgresConnectionManager<NoTls>>,
    schema: &str,
    table: &str,
    layer_name: &str,
) -> Result<LayerDef> {
    let rows = conn.query(
        "SELECT column_name, udt_name FROM information_schema.columns \
         WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
        &[&schema, &table],
    )?;

    if rows.is_empty() {
        return Err(Error::Config(format!("no table found for layer {layer_name:?} ({schema}.{table})")));
    }

    let mut attribute_columns = Vec::new();
    let mut geometry_column = None;

    for row in &rows {
        let column_name: String = row.get(0);
        let udt_name: String = row.get(1);
        if udt_name == GEOMETRY_UDT {
            geometry_column = Some(column_name);
        } else if ATTRIBUTE_UDTS.contains(&udt_name.as_str()) {
            attribute_columns.push(column_name);
        }
    }

    let geometry_column = geometry_column.ok_or_else(|| {
        warn!("layer {layer_name:?} ({schema}.{table}) has no geometry column");
        Error::Config(format!("no geometry column found for layer {layer_name:?} ({schema}.{table})"))
    })?;

    let query_sql = compose_query(schema, table, &geometry_column, &attribute_columns);

    Ok(LayerDef {
        name: layer_name.to_string(),
        attribute_columns,
        query_sql,
    })
}

/// Identifiers (schema/table/column names) are substituted directly,
/// never as bind parameters; they come from configuration or the
/// database catalog, not from a request. Quoting guards against
/// reserved words and mixed-case names.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn compose_query(schema: &str, table: &str, geom_col: &str, attrs: &[String]) -> String {
    let geom = quote_ident(geom_col);
    let mut select_cols = format!(
        "ST_AsBinary(ST_Intersection({geom}, ST_MakeEnvelope($1,$2,$3,$4,$5))) AS geom"
    );
    for a in attrs {
        select_cols.push_str(&format!(", {}", quote_ident(a)));
    }

    format!(
        "SELECT {select_cols} FROM {}.{} WHERE ST_Intersects({geom}, ST_MakeEnvelope($1,$2,$3,$4,$5)) LIMIT 20000",
        quote_ident(schema),
        quote_ident(table),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_expected_shape() {
        let sql = compose_query("public", "places", "geom", &["name".to_string(), "kind".to_string()]);
        assert!(sql.starts_with("SELECT ST_AsBinary(ST_Intersection(\"geom\""));
        assert!(sql.contains("\"name\""));
        assert!(sql.contains("\"kind\""));
        assert!(sql.contains("FROM \"public\".\"places\""));
        assert!(sql.contains("LIMIT 20000"));
    }

    #[test]
    fn quotes_embedded_double_quotes() {
        assert_eq!(quote_ident("weird\"name"), "\"weird\"\"name\"");
    }
}

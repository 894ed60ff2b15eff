//! Pooled PostGIS connection.
//!
//! Bound at 10 concurrent connections, matching
//! `original_source/data/data.go`'s `NewDb` (`pgx.ConnPoolConfig{MaxConnections: 10}`).

use postgres::NoTls;
use r2d2_postgres::PostgresConnectionManager;

use crate::error::{Error, Result};

pub type Pool = r2d2::Pool<PostgresConnectionManager<NoTls>>;

const MAX_POOL_SIZE: u32 = 10;

pub fn connect(conn_str: &str) -> Result<Pool> {
    let manager = manager_for(conn_str)?;
    r2d2::Pool::builder()
        .max_size(MAX_POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::Config(format!("building connection pool: {e}")))
}

/// Builds a pool without eagerly opening a connection. `connect` fails
/// fast at startup (matching the "fail before the listener opens"
/// contract); this variant exists for tests that need a `Pool` value to
/// construct service state without a live database behind it.
pub fn connect_unchecked(conn_str: &str) -> Result<Pool> {
    let manager = manager_for(conn_str)?;
    Ok(r2d2::Pool::builder()
        .max_size(MAX_POOL_SIZE)
        .build_unchecked(manager))
}

fn manager_for(conn_str: &str) -> Result<PostgresConnectionManager<NoTls>> {
    let config: postgres::Config = conn_str
        .parse()
        .map_err(|e: postgres::Error| Error::Config(format!("invalid postgres connection string: {e}")))?;
    Ok(PostgresConnectionManager::new(config, NoTls))
}

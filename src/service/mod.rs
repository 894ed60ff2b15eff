//! HTTP surface: request handlers and router composition.

pub mod cors;
pub mod handlers;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use crate::builder::Builder;
use crate::cache::Cache;

/// Shared, immutable per-process state handed to every handler.
pub struct AppState {
    pub builder: Builder,
    pub cache: Arc<dyn Cache>,
    pub fonts_dir: PathBuf,
    pub service_id: String,
}

pub use routes::build_router;

//! Route handlers.
//!
//! `tile_handler`/`font_handler` mirror `original_source/cmd/gravad/main.go`'s
//! `NewMVTHandler`/`FontHandler`: parse the route, validate, dispatch to the
//! pipeline, write either the payload or a structured JSON error.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use log::log;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use crate::cache::tile_key;
use crate::error::Error;
use crate::projection::tile_to_bbox;

#[derive(Serialize)]
struct ErrorBody {
    code: i32,
    message: String,
}

fn error_response(err: Error) -> Response {
    log!(err.log_level(), "request failed: {err}");
    let status = err.status();
    let body = ErrorBody {
        code: err.code(),
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "serviceID": state.service_id }))
}

pub async fn tile_handler(
    State(state): State<Arc<AppState>>,
    Path((name, z, x, y)): Path<(String, u32, u32, u32)>,
) -> Response {
    let result =
        tokio::task::spawn_blocking(move || build_tile_bytes(&state, &name, z, x, y)).await;

    match result {
        Ok(Ok(bytes)) => {
            let len = bytes.len();
            (
                StatusCode::OK,
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.mapbox-vector-tile".to_string(),
                    ),
                    (header::CONTENT_LENGTH, len.to_string()),
                ],
                Body::from(bytes),
            )
                .into_response()
        }
        Ok(Err(e)) => error_response(e),
        Err(_) => error_response(Error::Encoding("tile build task panicked".into())),
    }
}

fn valid_source_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn build_tile_bytes(state: &AppState, name: &str, z: u32, x: u32, y: u32) -> crate::error::Result<Vec<u8>> {
    if !valid_source_name(name) {
        return Err(Error::UnknownSource(name.to_string()));
    }
    let span = 1u32.checked_shl(z).ok_or_else(|| {
        Error::InvalidTileAddress(format!("zoom {z} out of range"))
    })?;
    if x >= span || y >= span {
        return Err(Error::InvalidTileAddress(format!("{z}/{x}/{y} out of range")));
    }

    let key = tile_key(name, x, y, z);
    if let Some(bytes) = state.cache.get(&key) {
        return Ok(bytes);
    }

    let bbox = tile_to_bbox(z, x, y)?;
    let tile = state.builder.build(name, &bbox)?;
    let bytes = tile.encode();
    state.cache.set(&key, bytes.clone());
    Ok(bytes)
}

pub async fn font_handler(
    State(state): State<Arc<AppState>>,
    Path((font, file)): Path<(String, String)>,
) -> Response {
    if !file.ends_with("pbf") {
        return error_response(Error::UnknownSource(file));
    }
    let path = state.fonts_dir.join(&font).join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            Body::from(bytes),
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error_response(Error::UnknownSource(format!("{font}/{file}")))
        }
        Err(e) => error_response(Error::Config(format!("reading font file: {e}"))),
    }
}

pub async fn not_found_handler() -> Response {
    error_response(Error::UnknownSource("route".to_string()))
}

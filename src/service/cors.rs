//! Optional CORS middleware.
//!
//! Header set matches `original_source/web/web.go`'s `NewCorsHandler`
//! exactly, including the credentialed wildcard origin and the 3600s
//! preflight cache. Hand-rolled as an axum middleware rather than
//! `tower_http::cors::CorsLayer`: that layer refuses at construction
//! time to pair `allow_credentials(true)` with a wildcard origin, which
//! is precisely the (intentionally permissive) combination this
//! service's contract calls for.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

const ALLOW_HEADERS: &str =
    "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization";
const ALLOW_METHODS: &str = "GET, HEAD";
const EXPOSE_HEADERS: &str = "Content-Length, Content-Type";
const MAX_AGE: &str = "3600";

fn apply_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
}

pub async fn layer(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut res = StatusCode::OK.into_response();
        apply_headers(res.headers_mut());
        return res;
    }
    let mut res = next.run(req).await;
    apply_headers(res.headers_mut());
    res
}

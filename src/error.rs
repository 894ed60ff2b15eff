use axum::http::StatusCode;
use log::Level;

/// Errors surfaced anywhere in the tile pipeline or service glue.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid tile address: {0}")]
    InvalidTileAddress(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("database error: {0}")]
    Database(#[from] postgres::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("geometry decode error: {0}")]
    GeometryDecode(String),

    #[error("mvt encoding error: {0}")]
    Encoding(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

impl Error {
    /// HTTP status this error maps to when it reaches the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidTileAddress(_) => StatusCode::BAD_REQUEST,
            Error::UnknownSource(_) => StatusCode::NOT_FOUND,
            Error::Database(_)
            | Error::Pool(_)
            | Error::GeometryDecode(_)
            | Error::Encoding(_)
            | Error::InvalidCoordinate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log level this error should be recorded at.
    pub fn log_level(&self) -> Level {
        match self {
            Error::InvalidTileAddress(_) | Error::UnknownSource(_) => Level::Warn,
            Error::Cache(_) => Level::Warn,
            _ => Level::Error,
        }
    }

    /// Numeric error code embedded in the client-facing JSON body.
    ///
    /// No domain-specific codes are defined yet; every variant reports 0
    /// per the error body contract.
    pub fn code(&self) -> i32 {
        0
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error handling

use axum::response::IntoResponse;
use tracing::info;

/// Errors raised by the web layer outside of the generation pipeline.
#[derive(Debug)]
pub enum ImagegenError {
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for ImagegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::InternalServerError(message) => write!(f, "Internal server error: {message}"),
        }
    }
}

impl std::error::Error for ImagegenError {}

impl From<std::io::Error> for ImagegenError {
    fn from(err: std::io::Error) -> Self {
        ImagegenError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ImagegenError {
    fn from(err: axum::http::Error) -> Self {
        ImagegenError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for ImagegenError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ImagegenError::NotFound(path) => {
                info!("404 {path}");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Not Found"));
                *response.status_mut() = axum::http::StatusCode::NOT_FOUND;
                response
            }
            ImagegenError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Internal server error"));
                *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

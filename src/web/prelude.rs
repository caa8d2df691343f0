pub(crate) use crate::error::ImagegenError;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Path, State};
pub(crate) use axum::http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
pub(crate) use serde::Deserialize;
pub(crate) use tracing::{error, info, warn};

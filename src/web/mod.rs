//! HTTP surface: the form page, the generate action and saved images.

use std::num::NonZeroU16;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::pipeline::Pipeline;

mod images;
mod prelude;
mod views;

use images::image_handler;
use views::{generate_handler, root_handler};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pipeline: Pipeline,
}

impl AppState {
    fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/generate", axum::routing::post(generate_handler))
        .route("/images/{filename}", axum::routing::get(image_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .layer(TraceLayer::new_for_http())
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Serves the app until Ctrl-C.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: Pipeline,
) -> Result<(), anyhow::Error> {
    tokio::fs::create_dir_all(pipeline.store().dir()).await?;
    let app = create_router().with_state(AppState::new(pipeline));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

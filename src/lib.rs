use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use std::error::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::assets::serve_assets;
use crate::handler::{AppState, create_snippet, get_snippet, healthcheck, not_found, show_snippet};

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod expiry;
pub mod handler;
pub mod model;
pub mod slug;
pub mod store;

pub fn unpack_error(err: &dyn Error) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    // Method mismatches on known paths answer 404 like unknown paths do.
    Router::new()
        .route("/api/health", get(healthcheck).fallback(not_found))
        .route("/api/snips", post(create_snippet).fallback(not_found))
        .route("/api/snips/:id", get(get_snippet).fallback(not_found))
        .route("/s/:id", get(show_snippet).fallback(not_found))
        .fallback(serve_assets)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Serves until `shutdown` is cancelled, then drains in-flight requests.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    axum::serve(listener, routes(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

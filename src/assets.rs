use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::handler::{AppState, not_found};

/// Fallback for every path the API does not claim. `/` resolves to `index.html`.
pub async fn serve_assets(State(state): State<AppState>, req: Request<Body>) -> Response {
    if req.method() != &Method::GET && req.method() != &Method::HEAD {
        return not_found().await;
    }

    let dir = ServeDir::new(&state.config.app.assets_dir).append_index_html_on_directories(true);
    match dir.oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

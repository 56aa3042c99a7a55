use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::api::{self, HealthResponse};
use crate::config::Config;
use crate::expiry::is_expired;
use crate::model::Snippet;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Store::new(config.app.database.clone());
        AppState {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    fn ttl_seconds(&self) -> i64 {
        self.config.app.ttl_seconds
    }
}

enum Lookup {
    Found(Snippet),
    Gone,
    Failed,
}

async fn lookup_live(state: &AppState, id: &str) -> Lookup {
    match state.store.find(id).await {
        Ok(Some(snippet)) if !is_expired(snippet.created_at.as_deref(), state.ttl_seconds()) => {
            Lookup::Found(snippet)
        }
        Ok(Some(_)) => {
            tracing::debug!(id, "snippet expired");
            Lookup::Gone
        }
        Ok(None) => Lookup::Gone,
        Err(e) => {
            tracing::error!(error = %crate::unpack_error(&e), id, "failed to load snippets");
            Lookup::Failed
        }
    }
}

pub async fn healthcheck() -> Response {
    api::success(&HealthResponse { status: "ok" })
}

pub async fn create_snippet(State(state): State<AppState>, body: Bytes) -> Response {
    let text = api::form_field(&body, "text").unwrap_or_default();
    let len = text.len();
    match state.store.create(text).await {
        Ok(snippet) => {
            tracing::info!(id = %snippet.id, bytes = len, "snippet created");
            api::created(&snippet)
        }
        Err(e) => {
            tracing::error!(error = %crate::unpack_error(&e), "failed to create snippet");
            api::internal_error("failed to create snippet")
        }
    }
}

pub async fn get_snippet(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match lookup_live(&state, &id).await {
        Lookup::Found(snippet) => api::success(&snippet),
        Lookup::Gone => api::not_found("snippet not found"),
        Lookup::Failed => api::internal_error("failed to load snippet"),
    }
}

pub async fn show_snippet(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match lookup_live(&state, &id).await {
        Lookup::Found(snippet) => Html(render_snippet(&snippet)).into_response(),
        Lookup::Gone => (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response(),
        Lookup::Failed => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn not_found() -> Response {
    api::not_found("not found")
}

const NOT_FOUND_PAGE: &str = "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Not Found</title></head>\n<body><h1>404 Not Found</h1></body></html>";

pub fn render_snippet(snippet: &Snippet) -> String {
    let id = escape_html(&snippet.id);
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Snip {id}</title></head>\n<body><h1>Snip {id}</h1><pre>{}</pre></body></html>",
        escape_html(&snippet.text)
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#x27;y&#x27;&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn page_embeds_escaped_text() {
        let snippet = Snippet::new("abc123".into(), "a <b> c".into(), "2025-01-01T00:00:00Z".into());
        let page = render_snippet(&snippet);
        assert!(page.contains("<title>Snip abc123</title>"));
        assert!(page.contains("<pre>a &lt;b&gt; c</pre>"));
    }
}

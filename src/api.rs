use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// First value of `name` in an `application/x-www-form-urlencoded` body.
///
/// The content type is not checked. Repeated fields keep the first value and
/// invalid UTF-8 is replaced rather than rejected.
pub fn form_field(body: &[u8], name: &str) -> Option<String> {
    body.split(|b| *b == b'&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = match pair.iter().position(|b| *b == b'=') {
                Some(eq) => (&pair[..eq], &pair[eq + 1..]),
                None => (pair, &pair[pair.len()..]),
            };
            (decode_form_component(key) == name).then(|| decode_form_component(value))
        })
}

fn decode_form_component(raw: &[u8]) -> String {
    let spaced: Vec<u8> = raw.iter().map(|b| if *b == b'+' { b' ' } else { *b }).collect();
    String::from_utf8_lossy(&urlencoding::decode_binary(&spaced)).into_owned()
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Like `axum::Json`, but declares the charset explicitly.
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut res = (status, Body::from(bytes)).into_response();
            res.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(JSON_CONTENT_TYPE),
            );
            res
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn success<T: Serialize>(data: &T) -> Response {
    json(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: &T) -> Response {
    json(StatusCode::CREATED, data)
}

pub fn not_found(msg: &str) -> Response {
    json(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: msg.to_string(),
        },
    )
}

pub fn internal_error(msg: &str) -> Response {
    json(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorResponse {
            error: msg.to_string(),
        },
    )
}

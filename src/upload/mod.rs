//! Asset upload relay.
//!
//! `POST /api/assets/upload` hands the multipart body to the backend
//! untouched, along with the caller's cookies so the backend can check the
//! session itself. One attempt per request; nothing is retried.

pub mod backend;

pub use backend::{BackendReply, HttpUploadBackend, UploadBackend, UploadRequest};

use crate::config::UploadConfig;
use crate::error::{EdgeError, Result};
use crate::i18n::{MessageKey, Messages};
use crate::pages::{check_declared_length, ensure_request_id, read_limited_body};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{
        header::{CONTENT_TYPE, COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Relay an asset upload to the backend
#[axum::debug_handler]
pub async fn upload_handler(State(state): State<AppState>, req: Request) -> Response {
    let messages = state.catalog.negotiate(req.headers());

    match forward_upload(&state, req, messages).await {
        Ok(response) => response,
        Err(e) => e.into_localized_response(messages),
    }
}

async fn forward_upload(state: &AppState, req: Request, messages: &Messages) -> Result<Response> {
    let (mut parts, body) = req.into_parts();

    let content_type = multipart_content_type(&parts.headers)?;
    check_declared_length(&parts.headers, state.upload.max_body_bytes)?;

    let request_id = ensure_request_id(&mut parts.headers);
    let cookie = joined_cookies(&parts.headers);
    let body = read_limited_body(body, state.upload.max_body_bytes).await?;

    info!(
        request_id = %request_id,
        bytes = body.len(),
        has_cookie = cookie.is_some(),
        "Relaying asset upload"
    );

    let reply = state
        .uploads
        .upload(UploadRequest {
            content_type,
            cookie,
            request_id: request_id.clone(),
            body,
        })
        .await?;

    if !reply.status.is_success() {
        warn!(
            request_id = %request_id,
            status = reply.status.as_u16(),
            "Backend rejected upload"
        );
    }

    relay(reply, &state.upload, messages)
}

/// Turn the backend's reply into the response for the client.
///
/// Failures keep the backend's status and its JSON body, or a generic
/// message when the body is not JSON. Successes must carry JSON.
pub fn relay(reply: BackendReply, config: &UploadConfig, messages: &Messages) -> Result<Response> {
    if !reply.status.is_success() {
        let body = serde_json::from_slice::<Value>(&reply.body)
            .unwrap_or_else(|_| json!({ "error": messages.get(MessageKey::UploadFailed) }));
        return Ok((reply.status, Json(body)).into_response());
    }

    let body = serde_json::from_slice::<Value>(&reply.body).map_err(|e| {
        EdgeError::InvalidBackendResponse(format!("Upload reply is not JSON: {}", e))
    })?;

    let status = if config.preserve_success_status {
        reply.status
    } else {
        StatusCode::OK
    };

    Ok((status, Json(body)).into_response())
}

fn multipart_content_type(headers: &HeaderMap) -> Result<HeaderValue> {
    let value = headers
        .get(CONTENT_TYPE)
        .ok_or_else(|| EdgeError::UnsupportedMediaType("missing content type".to_string()))?;

    let is_multipart = value
        .to_str()
        .map(|v| v.trim().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        return Err(EdgeError::UnsupportedMediaType(format!("{:?}", value)));
    }

    Ok(value.clone())
}

fn joined_cookies(headers: &HeaderMap) -> Option<String> {
    let cookies: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

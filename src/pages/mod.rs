use crate::error::{EdgeError, Result};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, HOST},
        HeaderMap, HeaderValue, Method, Response,
    },
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// Forwards allowed page requests to the page renderer
#[derive(Debug, Clone)]
pub struct PageForwarder {
    client: reqwest::Client,
    origin: String,
    max_body_bytes: usize,
}

impl PageForwarder {
    /// Create a forwarder for a renderer origin. Redirects from the renderer
    /// are relayed to the client, not followed.
    pub fn new(
        origin: impl Into<String>,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| EdgeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
            max_body_bytes,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Forward one request and relay the renderer's response
    pub async fn forward(&self, req: Request) -> Result<Response<Body>> {
        let method = req.method().clone();
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        let target = format!("{}{}", self.origin, path_and_query);

        let mut headers = req.headers().clone();
        if let Some(host) = headers.remove(HOST) {
            headers.insert(FORWARDED_HOST_HEADER, host);
        }
        ensure_request_id(&mut headers);

        check_declared_length(&headers, self.max_body_bytes)?;
        let body_bytes = read_limited_body(req.into_body(), self.max_body_bytes).await?;

        debug!(method = %method, target = %target, "Forwarding to renderer");

        let response = send_request(&self.client, method, headers, body_bytes, &target).await;
        match &response {
            Ok(resp) => info!(status = %resp.status(), target = %target, "Page request completed"),
            Err(e) => warn!(error = %e, target = %target, "Page request failed"),
        }
        response
    }
}

/// Fallback for everything the gate allowed that no API route claimed
pub async fn page_handler(State(state): State<AppState>, req: Request) -> Response<Body> {
    let messages = state.catalog.negotiate(req.headers());

    let Some(pages) = &state.pages else {
        let path = req.uri().path().to_string();
        return EdgeError::NotFound(path).into_localized_response(messages);
    };

    match pages.forward(req).await {
        Ok(response) => response,
        Err(e) => e.into_localized_response(messages),
    }
}

/// Add an `x-request-id` header when the client did not send one.
/// Returns the id in effect.
pub fn ensure_request_id(headers: &mut HeaderMap) -> String {
    if let Some(id) = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return id.to_string();
    }

    let id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    id
}

/// Reject early when the client announces a body over the limit
pub fn check_declared_length(headers: &HeaderMap, limit: usize) -> Result<()> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(length) if length > limit as u64 => Err(EdgeError::PayloadTooLarge { limit }),
        _ => Ok(()),
    }
}

/// Buffer a request body, failing once it grows past `limit`
pub async fn read_limited_body(body: Body, limit: usize) -> Result<Bytes> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(EdgeError::PayloadTooLarge { limit })
        }
        Err(e) => Err(EdgeError::Proxy(format!("Failed to read request body: {}", e))),
    }
}

/// Send request to the renderer
async fn send_request(
    client: &reqwest::Client,
    method: Method,
    headers: HeaderMap,
    body_bytes: Bytes,
    target: &str,
) -> Result<Response<Body>> {
    let mut upstream_req = client.request(method, target).body(body_bytes);

    // Forward headers (excluding hop-by-hop headers)
    for (name, value) in headers.iter() {
        if !is_hop_by_hop_header(name.as_str()) {
            upstream_req = upstream_req.header(name, value);
        }
    }

    let upstream_response = upstream_req.send().await.map_err(|e| {
        if e.is_timeout() {
            EdgeError::Renderer(format!("Renderer request timed out: {}", e))
        } else if e.is_connect() {
            EdgeError::Renderer(format!("Failed to connect to renderer: {}", e))
        } else {
            EdgeError::Renderer(format!("Renderer request failed: {}", e))
        }
    })?;

    let mut response_builder = Response::builder().status(upstream_response.status());

    for (name, value) in upstream_response.headers().iter() {
        if !is_hop_by_hop_header(name.as_str()) {
            response_builder = response_builder.header(name, value);
        }
    }

    let body_bytes = upstream_response
        .bytes()
        .await
        .map_err(|e| EdgeError::Renderer(format!("Failed to read renderer response: {}", e)))?;

    response_builder
        .body(Body::from(body_bytes))
        .map_err(|e| EdgeError::Internal(format!("Failed to build response: {}", e)))
}

/// Check if a header is a hop-by-hop header that should not be forwarded
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop_headers() {
        assert!(is_hop_by_hop_header("Connection"));
        assert!(is_hop_by_hop_header("connection"));
        assert!(is_hop_by_hop_header("Keep-Alive"));
        assert!(is_hop_by_hop_header("Transfer-Encoding"));
        assert!(!is_hop_by_hop_header("Content-Type"));
        assert!(!is_hop_by_hop_header("Cookie"));
    }

    #[test]
    fn test_ensure_request_id_keeps_existing() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        assert_eq!(ensure_request_id(&mut headers), "req-1");
    }

    #[test]
    fn test_ensure_request_id_generates() {
        let mut headers = HeaderMap::new();
        let id = ensure_request_id(&mut headers);
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(headers.get(REQUEST_ID_HEADER).unwrap(), id.as_str());
    }

    #[test]
    fn test_forwarder_trims_origin() {
        let forwarder =
            PageForwarder::new("http://renderer:3001/", Duration::from_secs(5), 1024).unwrap();
        assert_eq!(forwarder.origin(), "http://renderer:3001");
    }

    #[test]
    fn test_declared_length_over_limit() {
        let mut headers = HeaderMap::new();
        assert!(check_declared_length(&headers, 10).is_ok());

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("10"));
        assert!(check_declared_length(&headers, 10).is_ok());

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("11"));
        assert!(matches!(
            check_declared_length(&headers, 10),
            Err(EdgeError::PayloadTooLarge { limit: 10 })
        ));
    }

    #[tokio::test]
    async fn test_read_limited_body() {
        let body = Body::from(vec![0u8; 32]);
        assert!(matches!(
            read_limited_body(body, 16).await,
            Err(EdgeError::PayloadTooLarge { limit: 16 })
        ));

        let body = Body::from("hello");
        assert_eq!(read_limited_body(body, 16).await.unwrap(), Bytes::from("hello"));
    }
}

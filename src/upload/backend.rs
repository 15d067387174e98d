use crate::error::{EdgeError, Result};
use crate::pages::REQUEST_ID_HEADER;
use async_trait::async_trait;
use axum::http::{
    header::{CONTENT_TYPE, COOKIE},
    HeaderValue, StatusCode,
};
use bytes::Bytes;
use std::time::Duration;

/// One upload as it is handed to the backend
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Incoming content type, including the multipart boundary
    pub content_type: HeaderValue,
    /// Incoming cookies, joined into one header
    pub cookie: Option<String>,
    pub request_id: String,
    /// Raw multipart body
    pub body: Bytes,
}

/// What the backend answered
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Destination for asset uploads
#[async_trait]
pub trait UploadBackend: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<BackendReply>;
}

/// Posts uploads to the backend's asset endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpUploadBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpUploadBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EdgeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl UploadBackend for HttpUploadBackend {
    async fn upload(&self, request: UploadRequest) -> Result<BackendReply> {
        let mut backend_req = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, request.content_type)
            .header(REQUEST_ID_HEADER, request.request_id.as_str())
            .body(request.body);

        if let Some(cookie) = request.cookie {
            backend_req = backend_req.header(COOKIE, cookie);
        }

        let response = backend_req.send().await.map_err(|e| {
            if e.is_timeout() {
                EdgeError::Backend(format!("Backend request timed out: {}", e))
            } else if e.is_connect() {
                EdgeError::Backend(format!("Failed to connect to backend: {}", e))
            } else {
                EdgeError::Backend(format!("Backend request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| EdgeError::Backend(format!("Failed to read backend response: {}", e)))?;

        Ok(BackendReply { status, body })
    }
}

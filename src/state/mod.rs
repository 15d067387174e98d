use crate::config::{EdgeConfig, UploadConfig};
use crate::error::Result;
use crate::gate::{AuthGate, CookieSessionProbe, SessionProbe};
use crate::i18n::Catalog;
use crate::pages::PageForwarder;
use crate::upload::{HttpUploadBackend, UploadBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub catalog: Arc<Catalog>,
    pub uploads: Arc<dyn UploadBackend>,
    pub upload: UploadConfig,
    pub pages: Option<Arc<PageForwarder>>,
}

impl AppState {
    /// Wire the concrete implementations named by the configuration
    pub fn from_config(config: &EdgeConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.server.timeout_secs);

        let probe: Arc<dyn SessionProbe> = Arc::new(CookieSessionProbe::from_config(&config.gate));
        let gate = AuthGate::new(config.gate.clone(), probe)?;

        let catalog = Catalog::setup(&config.i18n)?;

        let upload_url = config.backend.upload_url();
        let uploads = HttpUploadBackend::new(upload_url.as_str(), timeout)?;
        info!(url = %upload_url, "Upload relay target");

        let pages = match &config.pages.renderer_origin {
            Some(origin) => {
                info!(origin = %origin, "Forwarding pages to renderer");
                Some(Arc::new(PageForwarder::new(
                    origin.as_str(),
                    timeout,
                    config.pages.max_body_bytes,
                )?))
            }
            None => None,
        };

        Ok(Self {
            gate: Arc::new(gate),
            catalog: Arc::new(catalog),
            uploads: Arc::new(uploads),
            upload: config.upload.clone(),
            pages,
        })
    }

    /// Replace the upload destination
    pub fn with_upload_backend(mut self, uploads: Arc<dyn UploadBackend>) -> Self {
        self.uploads = uploads;
        self
    }
}

use crate::error::{EdgeError, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that supplies the backend origin
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Prefix for layered environment overrides, e.g. `STUDIO_EDGE_SERVER__PORT`
pub const ENV_PREFIX: &str = "STUDIO_EDGE";

/// Main edge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// External backend that owns assets and sessions
    #[serde(default)]
    pub backend: BackendConfig,
    /// Cookie auth gate
    #[serde(default)]
    pub gate: GateConfig,
    /// Asset upload relay
    #[serde(default)]
    pub upload: UploadConfig,
    /// Page renderer forwarding
    #[serde(default)]
    pub pages: PagesConfig,
    /// Message catalog
    #[serde(default)]
    pub i18n: I18nConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend origin, e.g. "http://localhost:8000"
    #[serde(default = "default_backend_origin")]
    pub origin: String,
    /// Path of the asset upload endpoint on the backend
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
}

/// Auth gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Name of the authentication token cookie
    #[serde(default = "default_access_cookie")]
    pub access_cookie: String,
    /// Name of the refresh token cookie
    #[serde(default = "default_refresh_cookie")]
    pub refresh_cookie: String,
    /// Login page; unauthenticated visitors are sent here
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Registration page prefix
    #[serde(default = "default_register_path")]
    pub register_path: String,
    /// Where authenticated visitors of auth pages are sent
    #[serde(default = "default_home_path")]
    pub home_path: String,
    /// Regular expressions for paths the gate never touches
    #[serde(default = "default_exclusions")]
    pub exclude: Vec<String>,
}

/// Upload relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest request body accepted for relaying
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Relay the backend's 2xx status as-is instead of answering 200
    #[serde(default = "default_true")]
    pub preserve_success_status: bool,
}

/// Page forwarding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Origin of the page renderer; without one, unmatched paths are 404
    #[serde(default)]
    pub renderer_origin: Option<String>,
    /// Largest request body forwarded to the renderer
    #[serde(default = "default_page_body_bytes")]
    pub max_body_bytes: usize,
}

/// Message catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Locale used when the client expresses no usable preference
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Additional locale bundles
    #[serde(default)]
    pub locales: Vec<LocaleSource>,
}

/// A locale bundle on disk (YAML or JSON map of message key to text)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleSource {
    /// Language tag, e.g. "fr" or "pt-br"
    pub tag: String,
    /// Bundle file
    pub path: PathBuf,
}

/// Log output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Filter directives used when RUST_LOG is unset
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_timeout() -> u64 {
    30
}

fn default_backend_origin() -> String {
    "http://localhost:8000".to_string()
}

fn default_upload_path() -> String {
    "/assets/upload".to_string()
}

fn default_access_cookie() -> String {
    "accessToken".to_string()
}

fn default_refresh_cookie() -> String {
    "refreshToken".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_register_path() -> String {
    "/register".to_string()
}

fn default_home_path() -> String {
    "/".to_string()
}

fn default_exclusions() -> Vec<String> {
    vec![
        r"^/api(/|$)".to_string(),
        r"^/_next/static(/|$)".to_string(),
        r"^/_next/image(/|$)".to_string(),
        r"^/favicon\.ico$".to_string(),
        // any file request: last segment carries an extension
        r"/[^/]*\.[^/]*$".to_string(),
    ]
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_page_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            origin: default_backend_origin(),
            upload_path: default_upload_path(),
        }
    }
}

impl BackendConfig {
    /// Full URL of the backend upload endpoint
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), self.upload_path)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            access_cookie: default_access_cookie(),
            refresh_cookie: default_refresh_cookie(),
            login_path: default_login_path(),
            register_path: default_register_path(),
            home_path: default_home_path(),
            exclude: default_exclusions(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            preserve_success_status: default_true(),
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            renderer_origin: None,
            max_body_bytes: default_page_body_bytes(),
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            locales: vec![],
        }
    }
}

impl EdgeConfig {
    /// Load configuration: optional file, then `STUDIO_EDGE_*` variables,
    /// then `BACKEND_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(path, std::env::var(BACKEND_URL_ENV).ok())
    }

    /// Load configuration with an explicit backend origin override
    pub fn from_sources(path: Option<&Path>, backend_url: Option<String>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        Self::finish(builder, backend_url)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml));
        Self::finish(builder, None)
    }

    fn finish(
        builder: ConfigBuilder<config::builder::DefaultState>,
        backend_url: Option<String>,
    ) -> Result<Self> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("backend.origin", backend_url)
            .map_err(|e| EdgeError::Config(format!("Invalid override: {}", e)))?
            .build()
            .map_err(|e| EdgeError::Config(format!("Failed to read config: {}", e)))?
            .try_deserialize()
            .map_err(|e| EdgeError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_origin("backend.origin", &self.backend.origin)?;

        if let Some(renderer) = &self.pages.renderer_origin {
            validate_origin("pages.renderer_origin", renderer)?;
        }

        for (name, path) in [
            ("backend.upload_path", &self.backend.upload_path),
            ("gate.login_path", &self.gate.login_path),
            ("gate.register_path", &self.gate.register_path),
            ("gate.home_path", &self.gate.home_path),
        ] {
            if !path.starts_with('/') {
                return Err(EdgeError::Config(format!(
                    "{} must start with '/': {}",
                    name, path
                )));
            }
        }

        if self.gate.access_cookie.is_empty() || self.gate.refresh_cookie.is_empty() {
            return Err(EdgeError::Config(
                "Gate cookie names cannot be empty".to_string(),
            ));
        }

        for pattern in &self.gate.exclude {
            Regex::new(pattern)
                .map_err(|e| EdgeError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
        }

        if self.upload.max_body_bytes == 0 {
            return Err(EdgeError::Config(
                "upload.max_body_bytes must be > 0".to_string(),
            ));
        }

        if self.pages.max_body_bytes == 0 {
            return Err(EdgeError::Config(
                "pages.max_body_bytes must be > 0".to_string(),
            ));
        }

        if self.i18n.default_locale.trim().is_empty() {
            return Err(EdgeError::Config(
                "i18n.default_locale cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_origin(name: &str, origin: &str) -> Result<()> {
    let url = Url::parse(origin)
        .map_err(|e| EdgeError::Config(format!("{} is not a valid URL '{}': {}", name, origin, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(EdgeError::Config(format!(
            "{} must start with http:// or https://: {}",
            name, origin
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  timeout_secs: 10

backend:
  origin: "https://api.example.com"

gate:
  access_cookie: "session"
  login_path: "/signin"

upload:
  max_body_bytes: 1024
  preserve_success_status: false
"#;

        let config = EdgeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.timeout_secs, 10);
        assert_eq!(config.backend.origin, "https://api.example.com");
        assert_eq!(config.gate.access_cookie, "session");
        assert_eq!(config.gate.refresh_cookie, "refreshToken");
        assert_eq!(config.gate.login_path, "/signin");
        assert_eq!(config.upload.max_body_bytes, 1024);
        assert!(!config.upload.preserve_success_status);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = EdgeConfig::from_yaml("server: {}").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.backend.origin, "http://localhost:8000");
        assert_eq!(config.gate.exclude, default_exclusions());
        assert_eq!(config.i18n.default_locale, "en");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.upload.preserve_success_status);
        assert!(config.pages.renderer_origin.is_none());
        assert_eq!(config.pages.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_upload_url_joins_origin_and_path() {
        let backend = BackendConfig {
            origin: "http://backend:9000/".to_string(),
            upload_path: "/assets/upload".to_string(),
        };
        assert_eq!(backend.upload_url(), "http://backend:9000/assets/upload");
    }

    #[test]
    fn test_backend_override_wins_over_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "backend:\n  origin: \"http://from-file:1\"").unwrap();

        let config = EdgeConfig::from_sources(
            Some(file.path()),
            Some("http://from-env:2".to_string()),
        )
        .unwrap();
        assert_eq!(config.backend.origin, "http://from-env:2");

        let config = EdgeConfig::from_sources(Some(file.path()), None).unwrap();
        assert_eq!(config.backend.origin, "http://from-file:1");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config =
            EdgeConfig::from_sources(Some(Path::new("/nonexistent/edge.yaml")), None).unwrap();
        assert_eq!(config.backend.origin, "http://localhost:8000");
    }

    #[test]
    fn test_validate_invalid_backend() {
        let mut config = EdgeConfig::default();
        config.backend.origin = "invalid-url".to_string();
        assert!(config.validate().is_err());

        config.backend.origin = "ftp://files.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_pattern() {
        let mut config = EdgeConfig::default();
        config.gate.exclude.push("^/(unclosed".to_string());
        assert!(matches!(
            config.validate(),
            Err(EdgeError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_validate_relative_login_path() {
        let mut config = EdgeConfig::default();
        config.gate.login_path = "login".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_body_limit() {
        let mut config = EdgeConfig::default();
        config.upload.max_body_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = EdgeConfig::default();
        config.pages.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }
}

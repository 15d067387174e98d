//! Message catalog for caller-facing error text.
//!
//! The catalog is built once by [`Catalog::setup`] during bootstrap and the
//! handle travels in application state. Every bundle is complete: missing
//! keys are filled from the default locale, then from the built-in English
//! text, so lookups cannot fail at request time.

use crate::config::I18nConfig;
use crate::error::{EdgeError, Result};
use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap};
use config::{Config, File};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};

/// Keys of caller-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    InternalError,
    UploadFailed,
    UploadTooLarge,
    UnsupportedMediaType,
    NotFound,
    BadGateway,
}

impl MessageKey {
    pub const ALL: [MessageKey; 6] = [
        MessageKey::InternalError,
        MessageKey::UploadFailed,
        MessageKey::UploadTooLarge,
        MessageKey::UnsupportedMediaType,
        MessageKey::NotFound,
        MessageKey::BadGateway,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::InternalError => "internal_error",
            MessageKey::UploadFailed => "upload_failed",
            MessageKey::UploadTooLarge => "upload_too_large",
            MessageKey::UnsupportedMediaType => "unsupported_media_type",
            MessageKey::NotFound => "not_found",
            MessageKey::BadGateway => "bad_gateway",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            MessageKey::InternalError => "Internal server error",
            MessageKey::UploadFailed => "Upload failed",
            MessageKey::UploadTooLarge => "Upload too large",
            MessageKey::UnsupportedMediaType => "Expected multipart/form-data",
            MessageKey::NotFound => "Not found",
            MessageKey::BadGateway => "Bad gateway",
        }
    }
}

impl FromStr for MessageKey {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self> {
        MessageKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| EdgeError::Locale(format!("Unknown message key: {}", s)))
    }
}

/// A complete set of messages for one locale
#[derive(Debug, Clone)]
pub struct Messages {
    entries: HashMap<MessageKey, String>,
}

impl Default for Messages {
    fn default() -> Self {
        let entries = MessageKey::ALL
            .into_iter()
            .map(|key| (key, key.builtin().to_string()))
            .collect();
        Self { entries }
    }
}

impl Messages {
    pub fn get(&self, key: MessageKey) -> &str {
        self.entries
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.builtin())
    }

    fn overlay(&self, overrides: HashMap<MessageKey, String>) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(overrides);
        Self { entries }
    }
}

/// Locale bundles keyed by lowercase language tag
#[derive(Debug, Clone)]
pub struct Catalog {
    default_locale: String,
    bundles: HashMap<String, Messages>,
}

impl Catalog {
    /// Build the catalog from configuration, reading every bundle file.
    pub fn setup(config: &I18nConfig) -> Result<Self> {
        let default_locale = normalize_tag(&config.default_locale);

        let mut raw = HashMap::new();
        for source in &config.locales {
            let entries = load_bundle(&source.path)?;
            debug!(
                locale = %source.tag,
                path = %source.path.display(),
                entries = entries.len(),
                "Loaded locale bundle"
            );
            raw.insert(normalize_tag(&source.tag), entries);
        }

        let base = match raw.remove(&default_locale) {
            Some(entries) => Messages::default().overlay(entries),
            None => Messages::default(),
        };

        let mut bundles: HashMap<String, Messages> = raw
            .into_iter()
            .map(|(tag, entries)| (tag, base.overlay(entries)))
            .collect();
        bundles.insert(default_locale.clone(), base);

        info!(
            default_locale = %default_locale,
            locales = bundles.len(),
            "Message catalog ready"
        );

        Ok(Self {
            default_locale,
            bundles,
        })
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Messages for the default locale
    pub fn default_messages(&self) -> &Messages {
        &self.bundles[&self.default_locale]
    }

    /// Messages for a language tag, matching on the primary subtag if the
    /// full tag is unknown
    pub fn messages(&self, tag: &str) -> Option<&Messages> {
        let tag = normalize_tag(tag);
        self.bundles.get(&tag).or_else(|| {
            let primary = tag.split('-').next().unwrap_or_default();
            self.bundles.get(primary)
        })
    }

    /// Pick messages from the request's Accept-Language header
    pub fn negotiate(&self, headers: &HeaderMap) -> &Messages {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                preferred_tags(value)
                    .into_iter()
                    .find_map(|tag| self.messages(&tag))
            })
            .unwrap_or_else(|| self.default_messages())
    }
}

fn load_bundle(path: &std::path::Path) -> Result<HashMap<MessageKey, String>> {
    let raw: HashMap<String, String> = Config::builder()
        .add_source(File::from(path))
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| {
            EdgeError::Locale(format!("Failed to load bundle {}: {}", path.display(), e))
        })?;

    raw.into_iter()
        .map(|(key, text)| Ok((key.parse::<MessageKey>()?, text)))
        .collect()
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_lowercase()
}

/// Language tags from an Accept-Language value, highest weight first
fn preferred_tags(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let weight = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (weight > 0.0).then(|| (tag.to_string(), weight))
        })
        .collect();

    // stable: equal weights keep header order
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}

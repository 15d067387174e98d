use crate::config::GateConfig;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;

/// Decides whether a request carries a session
pub trait SessionProbe: Send + Sync {
    fn is_authenticated(&self, headers: &HeaderMap) -> bool;
}

/// Session presence from the access or refresh token cookie.
///
/// Only presence is checked; token validity is the backend's concern.
#[derive(Debug, Clone)]
pub struct CookieSessionProbe {
    access_cookie: String,
    refresh_cookie: String,
}

impl CookieSessionProbe {
    pub fn new(access_cookie: impl Into<String>, refresh_cookie: impl Into<String>) -> Self {
        Self {
            access_cookie: access_cookie.into(),
            refresh_cookie: refresh_cookie.into(),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(&config.access_cookie, &config.refresh_cookie)
    }
}

impl SessionProbe for CookieSessionProbe {
    fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        // unparseable pairs are skipped by the jar
        let jar = CookieJar::from_headers(headers);
        [&self.access_cookie, &self.refresh_cookie]
            .into_iter()
            .any(|name| jar.get(name).is_some_and(|c| !c.value().is_empty()))
    }
}

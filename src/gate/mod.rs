//! Cookie-based route gate.
//!
//! Every request that is not excluded is classified by session presence and
//! by whether it targets an auth page (login or registration):
//!
//! | session | auth page | outcome           |
//! |---------|-----------|-------------------|
//! | yes     | yes       | redirect to home  |
//! | yes     | no        | allow             |
//! | no      | yes       | allow             |
//! | no      | no        | redirect to login |
//!
//! The gate only reads cookies and never writes them.

pub mod exclusion;
pub mod middleware;
pub mod session;

pub use exclusion::ExclusionMatcher;
pub use middleware::gate_middleware;
pub use session::{CookieSessionProbe, SessionProbe};

use crate::config::GateConfig;
use crate::error::{EdgeError, Result};
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Pass the request through untouched
    Allow,
    /// Send the client elsewhere
    Redirect(String),
}

/// Auth gate with its session probe wired in explicitly
#[derive(Clone)]
pub struct AuthGate {
    config: GateConfig,
    exclusions: ExclusionMatcher,
    probe: Arc<dyn SessionProbe>,
}

impl AuthGate {
    /// Create a new gate from configuration and a session probe
    pub fn new(config: GateConfig, probe: Arc<dyn SessionProbe>) -> Result<Self> {
        let exclusions = ExclusionMatcher::new(&config.exclude)?;

        let gate = Self {
            config,
            exclusions,
            probe,
        };

        // A home page behind the auth-route prefix would redirect forever
        if gate.is_auth_route(&gate.config.home_path) {
            return Err(EdgeError::Config(format!(
                "Home path '{}' must not be a login or registration path",
                gate.config.home_path
            )));
        }

        Ok(gate)
    }

    /// Create a gate that checks the configured session cookies
    pub fn with_cookie_probe(config: GateConfig) -> Result<Self> {
        let probe = CookieSessionProbe::from_config(&config);
        Self::new(config, Arc::new(probe))
    }

    /// Login and registration pages
    pub fn is_auth_route(&self, path: &str) -> bool {
        path.starts_with(&self.config.login_path) || path.starts_with(&self.config.register_path)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.is_excluded(path)
    }

    /// Decide what happens to a request
    pub fn decide(&self, path: &str, headers: &HeaderMap) -> GateDecision {
        if self.is_excluded(path) {
            return GateDecision::Allow;
        }

        let authenticated = self.probe.is_authenticated(headers);
        let on_auth_route = self.is_auth_route(path);

        let decision = match (authenticated, on_auth_route) {
            (true, true) => GateDecision::Redirect(self.config.home_path.clone()),
            (false, false) => GateDecision::Redirect(self.config.login_path.clone()),
            _ => GateDecision::Allow,
        };

        if let GateDecision::Redirect(target) = &decision {
            debug!(
                path = %path,
                authenticated,
                target = %target,
                "Gate redirect"
            );
        }

        decision
    }
}

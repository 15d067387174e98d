use super::{AuthGate, GateDecision};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Apply the auth gate before any routing
pub async fn gate_middleware(
    State(gate): State<Arc<AuthGate>>,
    req: Request,
    next: Next,
) -> Response {
    match gate.decide(req.uri().path(), req.headers()) {
        GateDecision::Allow => next.run(req).await,
        GateDecision::Redirect(location) => Redirect::temporary(&location).into_response(),
    }
}

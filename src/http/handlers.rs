//! Route handlers.
//!
//! The route set is the union of the mesh's demo services; which downstream
//! the relay route calls comes from configuration. Handlers never touch span
//! lifecycle directly: the inbound hook owns start/end, handlers only attach
//! outcomes through the shared handle.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use crate::http::middleware::RequestId;
use crate::http::server::AppState;
use crate::trace::span::SharedSpan;

/// Degraded response body for failed downstream calls.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub service: String,
    pub request_id: String,
}

pub async fn root(State(state): State<AppState>) -> String {
    format!("{} is running", state.service_name)
}

pub async fn user(Path(id): Path<String>) -> String {
    format!("User ID: {id}")
}

#[derive(Debug, Serialize)]
pub struct Order {
    pub id: u32,
    pub user: &'static str,
    pub total: u32,
}

pub async fn stat() -> Json<Vec<Order>> {
    Json(vec![
        Order { id: 1, user: "alpha", total: 1500 },
        Order { id: 2, user: "beta", total: 2500 },
    ])
}

/// Fan-out route: call the configured downstream targets in order and embed
/// their bodies, or degrade to a structured 500 if any call fails.
pub async fn relay(
    State(state): State<AppState>,
    Extension(span): Extension<SharedSpan>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Response {
    match state.orchestrator.fan_out(&span, &state.relay_targets).await {
        Ok(replies) => {
            let combined = replies
                .iter()
                .map(|reply| reply.body.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            (StatusCode::OK, format!("Service 2 responded: {combined}")).into_response()
        }
        Err(error) => {
            // The orchestrator already marked the span; compose the
            // degraded payload instead of surfacing the raw failure.
            let body = ErrorBody {
                error: error.to_string(),
                service: state.service_name.to_string(),
                request_id,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

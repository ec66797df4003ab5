//! Inbound transport hook: extract, start span, run handler, end span.
//!
//! This replaces framework auto-instrumentation with one explicit
//! interception point. The handler body gets the span through request
//! extensions as a [`SharedSpan`]; the hook fixes the final status from the
//! handler's outcome and the response code.

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::http::server::AppState;
use crate::trace::propagation;
use crate::trace::span::{SharedSpan, SpanStatus};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation id for one inbound request, reused if the caller sent one.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn trace_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Absent or malformed context means this request starts a new trace.
    let parent = propagation::extract(request.headers());
    let name = format!("{} {}", request.method(), request.uri().path());

    let mut span = state.recorder.start_span(name, parent.as_ref());
    span.set_attribute("http.method", request.method().as_str());
    span.set_attribute("http.target", request.uri().path());
    span.set_attribute("request_id", request_id.clone());

    tracing::debug!(
        request_id = %request_id,
        trace_id = %span.context().trace_id,
        root = parent.is_none(),
        "request span started"
    );

    let shared = SharedSpan::new(span);
    request.extensions_mut().insert(shared.clone());
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    let status = response.status();
    shared.set_attribute("http.status_code", status.as_u16() as i64);
    let outcome = if shared.has_error() || status.is_server_error() {
        SpanStatus::Error
    } else {
        SpanStatus::Ok
    };
    shared.end(outcome);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

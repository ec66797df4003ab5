//! W3C trace context over HTTP headers.
//!
//! Single composite `traceparent` header:
//! `{version}-{trace_id}-{span_id}-{flags}`, e.g.
//! `00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`.
//!
//! Extraction is deliberately forgiving: absent or malformed headers yield
//! `None`, which callers treat as "start a new trace". Only version `00` is
//! accepted, and all-zero ids count as malformed.

use axum::http::{HeaderMap, HeaderValue};

use crate::trace::context::{SpanId, TraceContext, TraceId};

pub const TRACEPARENT: &str = "traceparent";

const SAMPLED_FLAG: u8 = 0x01;

/// Write the context into an outbound header map. Any existing value is
/// replaced.
pub fn inject(context: &TraceContext, headers: &mut HeaderMap) {
    let flags = if context.sampled { SAMPLED_FLAG } else { 0x00 };
    let value = format!("00-{}-{}-{:02x}", context.trace_id, context.span_id, flags);
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(TRACEPARENT, value);
    }
}

/// Parse the inbound header map. `None` means no usable context.
///
/// The returned context carries the sender's span id; a span started from it
/// becomes that span's child.
pub fn extract(headers: &HeaderMap) -> Option<TraceContext> {
    let raw = headers.get(TRACEPARENT)?.to_str().ok()?;
    parse_traceparent(raw)
}

fn parse_traceparent(raw: &str) -> Option<TraceContext> {
    let parts: Vec<&str> = raw.trim().split('-').collect();
    if parts.len() != 4 {
        return None;
    }
    if parts[0] != "00" {
        return None;
    }
    let trace_id = TraceId::from_hex(parts[1])?;
    let span_id = SpanId::from_hex(parts[2])?;
    if trace_id.is_zero() || span_id.is_zero() {
        return None;
    }
    if parts[3].len() != 2 {
        return None;
    }
    let flags = u8::from_str_radix(parts[3], 16).ok()?;

    Some(TraceContext {
        trace_id,
        span_id,
        parent_span_id: None,
        sampled: flags & SAMPLED_FLAG == SAMPLED_FLAG,
    })
}

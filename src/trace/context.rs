//! Trace identifiers and the context carried between services.

use std::fmt;

use rand::Rng;
use serde::Serializer;

/// 128-bit trace identifier, shared by every span in one causal chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(pub u128);

/// 64-bit span identifier, freshly generated per span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

impl TraceId {
    /// Generate a random, non-zero trace id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id: u128 = rng.gen();
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// Parse from 32 lowercase hex digits. Anything else is rejected.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 32 || !is_lower_hex(s) {
            return None;
        }
        u128::from_str_radix(s, 16).ok().map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl SpanId {
    /// Generate a random, non-zero span id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id: u64 = rng.gen();
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// Parse from 16 lowercase hex digits. Anything else is rejected.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 16 || !is_lower_hex(s) {
            return None;
        }
        u64::from_str_radix(s, 16).ok().map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// Exported span records carry ids as hex strings, not raw integers.
impl serde::Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl serde::Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Context for trace propagation between services.
///
/// `trace_id` is immutable across the whole chain. A child context keeps the
/// trace id, gets a fresh `span_id`, and records the parent's span id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub sampled: bool,
}

impl TraceContext {
    /// Start a new trace. Root spans are always sampled.
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
            parent_span_id: None,
            sampled: true,
        }
    }

    /// Derive a child context: same trace, new span, this span as parent.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::random(),
            parent_span_id: Some(self.span_id),
            sampled: self.sampled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_root() {
        let root = TraceContext::new_root();
        assert!(!root.trace_id.is_zero());
        assert!(!root.span_id.is_zero());
        assert!(root.parent_span_id.is_none());
        assert!(root.sampled);
    }

    #[test]
    fn test_child_links_to_parent() {
        let root = TraceContext::new_root();
        let child = root.child();

        assert_eq!(child.trace_id, root.trace_id);
        assert_ne!(child.span_id, root.span_id);
        assert_eq!(child.parent_span_id, Some(root.span_id));
        assert_eq!(child.sampled, root.sampled);
    }

    #[test]
    fn test_hex_round_trip() {
        let trace = TraceId::random();
        let span = SpanId::random();
        assert_eq!(TraceId::from_hex(&trace.to_string()), Some(trace));
        assert_eq!(SpanId::from_hex(&span.to_string()), Some(span));
    }

    #[test]
    fn test_hex_rejects_bad_input() {
        assert!(TraceId::from_hex("abc").is_none());
        assert!(TraceId::from_hex("0AF7651916CD43DD8448EB211C80319C").is_none());
        assert!(SpanId::from_hex("b7ad6b716920333g").is_none());
        assert!(SpanId::from_hex("").is_none());
    }
}

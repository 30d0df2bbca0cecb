//! Event-shape classification for raw Lambda payloads.
//!
//! The Lambda runtime delivers every trigger type through the same entry
//! point, so the payload has to be inspected structurally before it can be
//! deserialized into a typed event. The shapes overlap (several carry a
//! `requestContext`), which is why the checks are ordered.

use serde_json::Value;

/// The structural shape of an incoming Lambda payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// API Gateway REST API (payload format v1).
    RestApi,
    /// API Gateway HTTP API (payload format v2).
    HttpApi,
    /// API Gateway WebSocket connection event.
    WebSocket,
    /// SQS batch delivery.
    SqsBatch,
    /// Anything this crate does not recognize.
    Unknown,
}

impl EventKind {
    /// The `faas.trigger` value for this shape.
    pub fn trigger_type(&self) -> &'static str {
        match self {
            EventKind::RestApi | EventKind::HttpApi | EventKind::WebSocket => "http",
            EventKind::SqsBatch => "pubsub",
            EventKind::Unknown => "other",
        }
    }
}

/// Classifies a raw payload by its structural fields.
///
/// First match wins. REST API events expose both a `requestContext` and a
/// top-level `httpMethod`; HTTP API events nest the method under
/// `requestContext.http`; WebSocket events carry a `connectionId` in the
/// request context. SQS deliveries are a non-empty `Records` array whose
/// records name `aws:sqs` as their source.
///
/// Total over all inputs: unrecognized structures yield
/// [`EventKind::Unknown`], never an error.
pub fn identify(event: &Value) -> EventKind {
    if let Some(request_context) = event.get("requestContext") {
        if event.get("httpMethod").is_some() {
            return EventKind::RestApi;
        }
        if request_context.get("http").is_some() {
            return EventKind::HttpApi;
        }
        if request_context.get("connectionId").is_some() {
            return EventKind::WebSocket;
        }
    }

    let first_source = event
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .and_then(|record| record.get("eventSource"))
        .and_then(Value::as_str);

    if first_source == Some("aws:sqs") {
        return EventKind::SqsBatch;
    }

    EventKind::Unknown
}

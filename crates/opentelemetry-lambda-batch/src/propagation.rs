//! Trace-context extraction from message attributes and HTTP headers.
//!
//! Producers that instrument their SQS sends inject W3C trace context into
//! message attributes. A consumer cannot treat that context as a parent (a
//! batch may mix messages from many traces), so each recovered context
//! becomes a span link on the record's consumer span instead.

use std::collections::HashMap;

use aws_lambda_events::sqs::SqsMessage;
use opentelemetry::trace::{Link, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use opentelemetry_semantic_conventions::attribute::MESSAGING_MESSAGE_ID;

/// Converts a record's message attributes into a flat propagation carrier.
///
/// Only attributes carrying a string value participate; binary and list
/// attributes cannot hold a propagation header and are dropped.
pub fn message_carrier(record: &SqsMessage) -> HashMap<String, String> {
    record
        .message_attributes
        .iter()
        .filter_map(|(key, attribute)| {
            attribute
                .string_value
                .as_ref()
                .map(|value| (key.clone(), value.clone()))
        })
        .collect()
}

/// Recovers a span link from a record's propagated trace context.
///
/// Runs the globally configured propagator over the record's string-valued
/// message attributes. A valid remote context yields exactly one link tagged
/// with the originating message id; a missing or malformed context yields
/// `None`, which is the normal case for messages sent without propagation
/// headers.
pub fn extract_link(record: &SqsMessage) -> Option<Link> {
    let carrier = message_carrier(record);
    if carrier.is_empty() {
        return None;
    }

    let cx = opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&carrier)
    });

    let span_context = cx.span().span_context().clone();
    if !span_context.is_valid() {
        return None;
    }

    let mut attributes = Vec::new();
    if let Some(id) = &record.message_id {
        attributes.push(KeyValue::new(MESSAGING_MESSAGE_ID, id.clone()));
    }

    Some(Link::new(span_context, attributes, 0))
}

/// Recovers a remote parent context from an HTTP header carrier.
///
/// Falls back to the current context when the carrier holds no valid trace
/// context, so callers can always parent a new span on the result.
pub fn extract_remote_context(carrier: &HashMap<String, String>) -> Context {
    let cx = opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(carrier)
    });

    if cx.span().span_context().is_valid() {
        cx
    } else {
        Context::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use serial_test::serial;

    fn message_with_attributes(attributes: serde_json::Value) -> SqsMessage {
        let json = serde_json::json!({
            "messageId": "msg-123",
            "body": "payload",
            "attributes": {},
            "messageAttributes": attributes,
            "eventSource": "aws:sqs",
            "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:my-queue",
            "awsRegion": "us-east-1"
        });
        serde_json::from_value(json).expect("valid SQS message")
    }

    fn remote_context() -> Context {
        let span_context = SpanContext::new(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        Context::new().with_remote_span_context(span_context)
    }

    #[test]
    fn test_carrier_keeps_string_values_only() {
        let record = message_with_attributes(serde_json::json!({
            "traceparent": {
                "stringValue": "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
                "stringListValues": [],
                "binaryListValues": [],
                "dataType": "String"
            },
            "blob": {
                "binaryValue": "AAEC",
                "stringListValues": [],
                "binaryListValues": [],
                "dataType": "Binary"
            }
        }));

        let carrier = message_carrier(&record);
        assert_eq!(carrier.len(), 1);
        assert!(carrier.contains_key("traceparent"));
    }

    #[test]
    #[serial]
    fn test_extract_link_round_trip() {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let mut carrier = HashMap::new();
        opentelemetry::global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&remote_context(), &mut carrier)
        });

        let traceparent = carrier.get("traceparent").expect("injected").clone();
        let record = message_with_attributes(serde_json::json!({
            "traceparent": {
                "stringValue": traceparent,
                "stringListValues": [],
                "binaryListValues": [],
                "dataType": "String"
            }
        }));

        let link = extract_link(&record).expect("link recovered");
        assert_eq!(
            link.span_context.trace_id().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );
        assert_eq!(link.span_context.span_id().to_string(), "00f067aa0ba902b7");
        assert!(link.span_context.is_remote());
        assert_eq!(
            link.attributes,
            vec![KeyValue::new("messaging.message.id", "msg-123")]
        );
    }

    #[test]
    #[serial]
    fn test_no_metadata_yields_no_link() {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let record = message_with_attributes(serde_json::json!({}));
        assert!(extract_link(&record).is_none());
    }

    #[test]
    #[serial]
    fn test_malformed_context_yields_no_link() {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let record = message_with_attributes(serde_json::json!({
            "traceparent": {
                "stringValue": "not-a-traceparent",
                "stringListValues": [],
                "binaryListValues": [],
                "dataType": "String"
            }
        }));
        assert!(extract_link(&record).is_none());
    }

    #[test]
    #[serial]
    fn test_remote_context_from_headers() {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let mut carrier = HashMap::new();
        opentelemetry::global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&remote_context(), &mut carrier)
        });

        let cx = extract_remote_context(&carrier);
        assert!(cx.span().span_context().is_valid());
        assert_eq!(
            cx.span().span_context().trace_id().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );
    }

    #[test]
    #[serial]
    fn test_empty_headers_fall_back_to_current_context() {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let carrier = HashMap::new();
        let cx = extract_remote_context(&carrier);
        assert!(!cx.span().span_context().is_valid());
    }
}

//! Request/response hooks for the synchronous invocation path.
//!
//! These are the seams an invocation wrapper calls around the whole handler:
//! the request hook classifies the payload, enriches the active span, and
//! hands back the classified kind; the response hook takes that kind along
//! with the handler's result and enriches the span with response attributes.
//! The kind flows explicitly between the two call sites so concurrent
//! invocations cannot observe each other's classification.
//!
//! Neither hook can fail. A payload that does not deserialize into its
//! classified shape simply contributes no attributes.

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::sqs::SqsEvent;
use opentelemetry::trace::SpanRef;
use serde_json::Value;

use crate::extractors::{rest_api, sqs};
use crate::identify::{identify, EventKind};

/// Classifies the payload and enriches the span with request attributes.
///
/// REST API events get HTTP server attributes and a `"{METHOD} {route}"`
/// span name; SQS batches get the envelope's `receive` attributes and a
/// `"poll {queue}"` span name. Other shapes leave the span untouched.
pub fn on_request(span: &SpanRef<'_>, payload: &Value) -> EventKind {
    let kind = identify(payload);
    match kind {
        EventKind::RestApi => {
            if let Ok(event) = serde_json::from_value::<ApiGatewayProxyRequest>(payload.clone()) {
                span.set_attributes(rest_api::request_attributes(&event));
                span.update_name(rest_api::span_name(&event));
            }
        }
        EventKind::SqsBatch => {
            if let Ok(event) = serde_json::from_value::<SqsEvent>(payload.clone()) {
                span.set_attributes(sqs::batch_attributes(&event));
                span.update_name(sqs::span_name(&event));
            }
        }
        EventKind::HttpApi | EventKind::WebSocket | EventKind::Unknown => {}
    }
    kind
}

/// Enriches the span with response attributes for the classified kind.
///
/// Only REST API responses carry attributes today; the handler's result is
/// never modified, only observed.
pub fn on_response(span: &SpanRef<'_>, kind: EventKind, payload: &Value) {
    if kind == EventKind::RestApi {
        if let Ok(response) = serde_json::from_value::<ApiGatewayProxyResponse>(payload.clone()) {
            span.set_attributes(rest_api::response_attributes(&response));
        }
    }
}

//! Tower Service implementation for the synchronous invocation path.

use std::collections::HashMap;
use std::task::{Context as TaskContext, Poll};

use lambda_runtime::LambdaEvent;
use opentelemetry::global;
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer};
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{FAAS_INVOCATION_ID, FAAS_TRIGGER};
use serde_json::Value;
use tower::Service;

use crate::future::OtelInvocationFuture;
use crate::{hooks, propagation};

/// Tower service that instruments synchronous Lambda invocations.
///
/// For each call it:
/// 1. extracts a remote parent context from the event's HTTP headers
/// 2. starts a server span and runs the request hook (classify, attributes,
///    span name)
/// 3. invokes the inner service with the span's context attached
/// 4. runs the response hook, records status, and ends the span exactly once
///
/// The handler's result is returned untouched; failures are reflected on the
/// span only.
#[derive(Clone)]
pub struct OtelInvocationService<S> {
    inner: S,
}

impl<S> OtelInvocationService<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Service<LambdaEvent<Value>> for OtelInvocationService<S>
where
    S: Service<LambdaEvent<Value>, Response = Value>,
    S::Error: std::fmt::Display,
{
    type Response = Value;
    type Error = S::Error;
    type Future = OtelInvocationFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, event: LambdaEvent<Value>) -> Self::Future {
        let (payload, lambda_ctx) = event.into_parts();

        let carrier = header_carrier(&payload);
        let parent_cx = propagation::extract_remote_context(&carrier);

        let span_name = if lambda_ctx.env_config.function_name.is_empty() {
            "lambda.invoke".to_owned()
        } else {
            lambda_ctx.env_config.function_name.clone()
        };

        let tracer = global::tracer(crate::TRACER_NAME);
        let span = tracer
            .span_builder(span_name)
            .with_kind(SpanKind::Server)
            .start_with_context(&tracer, &parent_cx);
        let cx = parent_cx.with_span(span);

        // The request hook renames the span for recognized shapes; the
        // classified kind travels with the future to the response hook.
        let kind = hooks::on_request(&cx.span(), &payload);
        cx.span().set_attributes([
            KeyValue::new(FAAS_TRIGGER, kind.trigger_type()),
            KeyValue::new(FAAS_INVOCATION_ID, lambda_ctx.request_id.clone()),
        ]);

        let event = LambdaEvent::new(payload, lambda_ctx);

        let future = {
            let _guard = cx.clone().attach();
            self.inner.call(event)
        };

        OtelInvocationFuture::new(future, cx, kind)
    }
}

/// Flattens the event's `headers` object into a propagation carrier.
///
/// Header names are lowercased for the propagator's lookups; non-string
/// values are dropped.
fn header_carrier(payload: &Value) -> HashMap<String, String> {
    payload
        .get("headers")
        .and_then(Value::as_object)
        .map(|headers| {
            headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .as_str()
                        .map(|v| (name.to_ascii_lowercase(), v.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default()
}

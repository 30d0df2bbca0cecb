//! Future implementation that manages the invocation span lifecycle.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::Context;
use pin_project::pin_project;
use serde_json::Value;

use crate::hooks;
use crate::identify::EventKind;

/// Future that wraps an instrumented handler invocation.
///
/// Polls the inner future with the span's context attached so child spans
/// parent correctly, then on completion runs the response hook, records the
/// span status, and ends the span. The span ends exactly once: the context
/// is taken out of the future the first time the inner future resolves.
#[pin_project]
pub struct OtelInvocationFuture<F> {
    #[pin]
    inner: F,
    otel_cx: Option<Context>,
    kind: EventKind,
}

impl<F> OtelInvocationFuture<F> {
    pub(crate) fn new(inner: F, otel_cx: Context, kind: EventKind) -> Self {
        Self {
            inner,
            otel_cx: Some(otel_cx),
            kind,
        }
    }
}

impl<F, E> Future for OtelInvocationFuture<F>
where
    F: Future<Output = Result<Value, E>>,
    E: std::fmt::Display,
{
    type Output = Result<Value, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let poll_result = {
            let _guard = this.otel_cx.as_ref().map(|c| c.clone().attach());
            this.inner.poll(cx)
        };

        match poll_result {
            Poll::Ready(result) => {
                if let Some(otel_cx) = this.otel_cx.take() {
                    let span = otel_cx.span();
                    match &result {
                        Ok(payload) => {
                            hooks::on_response(&span, *this.kind, payload);
                            span.set_status(Status::Ok);
                        }
                        Err(error) => {
                            span.set_status(Status::error(error.to_string()));
                        }
                    }
                    span.end();
                }
                Poll::Ready(result)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

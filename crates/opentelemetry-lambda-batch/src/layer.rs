//! Tower Layer wiring the invocation hooks around a Lambda handler.

use tower::Layer;

use crate::service::OtelInvocationService;

/// Tower layer that instruments synchronous Lambda invocations.
///
/// The wrapped service sees the event and produces its result untouched; the
/// layer classifies the payload, starts a server span (parented on any
/// propagated trace context in the event's headers), enriches it with
/// request and response attributes, and ends it when the handler completes.
///
/// # Example
///
/// ```ignore
/// use opentelemetry_lambda_batch::OtelInvocationLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(OtelInvocationLayer::new())
///     .service(service_fn(handler));
/// ```
#[derive(Clone, Debug, Default)]
pub struct OtelInvocationLayer;

impl OtelInvocationLayer {
    /// Creates a new invocation tracing layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for OtelInvocationLayer {
    type Service = OtelInvocationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OtelInvocationService::new(inner)
    }
}

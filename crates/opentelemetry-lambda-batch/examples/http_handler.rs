//! API Gateway REST API example with automatic HTTP span attributes.
//!
//! The invocation layer classifies the payload, names the server span
//! `"{METHOD} {route}"` with path parameters normalized to `:param`, and
//! records request and response attributes following OpenTelemetry semantic
//! conventions. Query strings are redacted of known credential parameters
//! before they reach the span.
//!
//! # Running
//!
//! ```bash
//! cargo build --example http_handler --release
//! ```

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use opentelemetry_lambda_batch::OtelInvocationLayer;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use serde_json::{json, Value};
use tower::ServiceBuilder;

async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let path = event
        .payload
        .get("path")
        .and_then(Value::as_str)
        .unwrap_or("/");
    tracing::info!(path, "Handling request");

    Ok(json!({
        "statusCode": 200,
        "headers": { "Content-Type": "application/json" },
        "body": json!({ "path": path }).to_string(),
        "isBase64Encoded": false
    }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    let service = ServiceBuilder::new()
        .layer(OtelInvocationLayer::new())
        .service(service_fn(function_handler));

    run(service).await
}

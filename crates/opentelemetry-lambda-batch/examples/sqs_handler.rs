//! SQS Lambda example with per-record consumer spans.
//!
//! The invocation layer classifies the payload and names the server span
//! `poll <queue>`; `process_partial_response` then runs the record handler
//! under one consumer span per record, links producer trace context from
//! message attributes, and reports only the failed records back to the
//! Lambda runtime for redelivery.
//!
//! # Running
//!
//! ```bash
//! cargo build --example sqs_handler --release
//! ```

use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use opentelemetry_lambda_batch::{process_partial_response, OtelInvocationLayer};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use serde_json::Value;
use tower::ServiceBuilder;

async fn record_handler(record: SqsMessage) -> Result<(), Error> {
    let body = record.body.as_deref().unwrap_or_default();
    tracing::info!(
        message_id = ?record.message_id,
        body,
        "Processing SQS message"
    );

    if body.contains("poison") {
        return Err(Error::from("poison message"));
    }

    Ok(())
}

async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let batch: SqsEvent = serde_json::from_value(event.payload)?;
    let response = process_partial_response(&batch, record_handler).await;
    Ok(serde_json::to_value(response)?)
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

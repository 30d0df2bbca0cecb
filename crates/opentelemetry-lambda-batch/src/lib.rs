//! OpenTelemetry instrumentation for AWS Lambda event sources.
//!
//! This crate classifies incoming Lambda payloads by shape, extracts
//! semantic-convention attributes for the classified shape, and processes SQS
//! batches with per-record consumer spans, producer span links, and partial
//! failure reporting back to the Lambda runtime.
//!
//! # Architecture
//!
//! Three layers build on each other:
//!
//! - [`identify`] inspects the raw JSON payload and returns an [`EventKind`].
//!   Classification happens before deserialization because the runtime hands
//!   every trigger type to the same entry point.
//! - [`extractors`] are pure functions producing `Vec<KeyValue>` mappings per
//!   shape, following OpenTelemetry semantic conventions.
//! - [`batch`] drives a caller-supplied handler over every record in an SQS
//!   batch, isolating failures per record and returning an
//!   [`aws_lambda_events::sqs::SqsBatchResponse`] naming exactly the records
//!   to redeliver.
//!
//! For the synchronous path, [`OtelInvocationLayer`] is a Tower middleware
//! that runs the classification and extraction hooks around the whole
//! invocation.
//!
//! # SQS batch example
//!
//! ```no_run
//! use aws_lambda_events::sqs::{SqsEvent, SqsBatchResponse, SqsMessage};
//! use lambda_runtime::{run, service_fn, Error, LambdaEvent};
//! use opentelemetry_lambda_batch::process_partial_response;
//!
//! async fn record_handler(record: SqsMessage) -> Result<(), Error> {
//!     tracing::info!(body = ?record.body, "processing record");
//!     Ok(())
//! }
//!
//! async fn handler(event: LambdaEvent<SqsEvent>) -> Result<SqsBatchResponse, Error> {
//!     Ok(process_partial_response(&event.payload, record_handler).await)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     run(service_fn(handler)).await
//! }
//! ```
//!
//! # Trace context
//!
//! SQS producers that inject W3C trace context into message attributes are
//! linked (not parented) to each record's consumer span, preserving the async
//! boundary. Synchronous HTTP requests carrying a `traceparent` header become
//! the remote parent of the invocation span. Both paths go through the
//! globally configured propagator; set one via
//! `opentelemetry::global::set_text_map_propagator()`.

mod batch;
mod future;
mod hooks;
mod identify;
mod layer;
mod propagation;
mod service;

pub mod extractors;

pub use batch::{process_partial_response, process_record, ProcessingOutcome};
pub use future::OtelInvocationFuture;
pub use hooks::{on_request, on_response};
pub use identify::{identify, EventKind};
pub use layer::OtelInvocationLayer;
pub use propagation::{extract_link, extract_remote_context, message_carrier};
pub use service::OtelInvocationService;

/// Instrumentation scope name used for every span this crate starts.
pub(crate) const TRACER_NAME: &str = "opentelemetry-lambda-batch";

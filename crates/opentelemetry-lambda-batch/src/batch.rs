//! Partial-batch processing for SQS deliveries.
//!
//! Every record in a batch is processed through its own consumer span,
//! linked to the producer's span when the message carries propagated trace
//! context. A record's failure is captured in its outcome and never aborts
//! the remaining records; the batch response names exactly the records the
//! queue should redeliver.

use std::future::Future;

use aws_lambda_events::sqs::{BatchItemFailure, SqsBatchResponse, SqsEvent, SqsMessage};
use lambda_runtime::Error;
use opentelemetry::global;
use opentelemetry::trace::{FutureExt, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::Context;

use crate::extractors::sqs;
use crate::propagation;

/// The result of processing one batch record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// The record handler completed normally.
    Success,
    /// The record handler failed; carries the failure message.
    Failure(String),
}

impl ProcessingOutcome {
    /// Whether this outcome marks the record for redelivery.
    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessingOutcome::Failure(_))
    }
}

/// Processes one record inside a consumer span.
///
/// The span is named `"process {queue}"`, carries the record's messaging
/// attributes, and links to the producer span when the message carries
/// propagated context. Links bind at span creation; they cannot be attached
/// afterwards, which is why the span is built here rather than enriched by
/// the handler.
///
/// The handler's failure is converted into the returned outcome and recorded
/// as the span status. The span ends exactly once on every path.
pub async fn process_record<F, Fut>(record: &SqsMessage, handler: &F) -> ProcessingOutcome
where
    F: Fn(SqsMessage) -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    let span_name = match record
        .event_source_arn
        .as_deref()
        .and_then(sqs::destination_name)
    {
        Some(queue) => format!("process {queue}"),
        None => "process".to_owned(),
    };

    let links: Vec<_> = propagation::extract_link(record).into_iter().collect();

    let tracer = global::tracer(crate::TRACER_NAME);
    let span = tracer
        .span_builder(span_name)
        .with_kind(SpanKind::Consumer)
        .with_attributes(sqs::record_attributes(record))
        .with_links(links)
        .start(&tracer);
    let cx = Context::current_with_span(span);

    let result = handler(record.clone()).with_context(cx.clone()).await;

    let span = cx.span();
    let outcome = match result {
        Ok(()) => {
            span.set_status(Status::Ok);
            ProcessingOutcome::Success
        }
        Err(error) => {
            let message = error.to_string();
            span.set_status(Status::error(message.clone()));
            ProcessingOutcome::Failure(message)
        }
    };
    span.end();

    outcome
}

/// Processes every record in the batch and reports the failed subset.
///
/// Records are processed in delivery order, each through [`process_record`].
/// The enclosing invocation span is enriched with the envelope's `receive`
/// attributes before any record runs.
///
/// Outcome slots are pre-filled as failures and overwritten per record, so a
/// record that is never attempted is still reported for redelivery; an
/// unprocessed record must never be dropped from the response as if it had
/// succeeded. An empty batch yields an empty response without invoking the
/// handler.
pub async fn process_partial_response<F, Fut>(event: &SqsEvent, handler: F) -> SqsBatchResponse
where
    F: Fn(SqsMessage) -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    Context::current()
        .span()
        .set_attributes(sqs::batch_attributes(event));

    let mut outcomes =
        vec![ProcessingOutcome::Failure("not attempted".to_owned()); event.records.len()];

    for (slot, record) in outcomes.iter_mut().zip(&event.records) {
        *slot = process_record(record, &handler).await;
    }

    let batch_item_failures = event
        .records
        .iter()
        .zip(&outcomes)
        .filter(|(_, outcome)| outcome.is_failure())
        .map(|(record, outcome)| {
            let item_identifier = record.message_id.clone().unwrap_or_default();
            if let ProcessingOutcome::Failure(reason) = outcome {
                tracing::warn!(
                    message_id = %item_identifier,
                    error = %reason,
                    "record handler failed, marking for redelivery"
                );
            }
            BatchItemFailure { item_identifier }
        })
        .collect();

    SqsBatchResponse {
        batch_item_failures,
    }
}

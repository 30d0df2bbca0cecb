//! Attribute extraction for SQS batch deliveries.
//!
//! Follows the messaging span conventions:
//! <https://opentelemetry.io/docs/specs/semconv/messaging/messaging-spans/>
//!
//! The envelope gets `receive`-side attributes (the poll that pulled the
//! batch); each record gets `process`-side attributes for its own consumer
//! span.

use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{
    CLOUD_REGION, MESSAGING_BATCH_MESSAGE_COUNT, MESSAGING_DESTINATION_NAME,
    MESSAGING_DESTINATION_SUBSCRIPTION_NAME, MESSAGING_MESSAGE_ID, MESSAGING_OPERATION_NAME,
    MESSAGING_OPERATION_TYPE, MESSAGING_SYSTEM,
};

/// Builds the envelope span name, `"poll {destination}"`.
pub fn span_name(event: &SqsEvent) -> String {
    match event
        .records
        .first()
        .and_then(|r| r.event_source_arn.as_deref())
        .and_then(destination_name)
    {
        Some(queue) => format!("poll {queue}"),
        None => "poll".to_owned(),
    }
}

/// Extracts envelope-level attributes for the receiving span.
pub fn batch_attributes(event: &SqsEvent) -> Vec<KeyValue> {
    vec![
        KeyValue::new(MESSAGING_OPERATION_NAME, "poll"),
        KeyValue::new(MESSAGING_OPERATION_TYPE, "receive"),
        KeyValue::new(MESSAGING_SYSTEM, "aws_sqs"),
        KeyValue::new(MESSAGING_BATCH_MESSAGE_COUNT, event.records.len() as i64),
    ]
}

/// Extracts record-level attributes for a consumer span.
pub fn record_attributes(record: &SqsMessage) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new(MESSAGING_OPERATION_NAME, "process"),
        KeyValue::new(MESSAGING_OPERATION_TYPE, "process"),
        KeyValue::new(MESSAGING_SYSTEM, "aws_sqs"),
    ];

    if let Some(id) = &record.message_id {
        attrs.push(KeyValue::new(MESSAGING_MESSAGE_ID, id.clone()));
    }

    if let Some(arn) = &record.event_source_arn {
        attrs.push(KeyValue::new(
            MESSAGING_DESTINATION_SUBSCRIPTION_NAME,
            arn.clone(),
        ));
        if let Some(queue) = destination_name(arn) {
            attrs.push(KeyValue::new(MESSAGING_DESTINATION_NAME, queue.to_owned()));
        }
    }

    if let Some(region) = &record.aws_region {
        attrs.push(KeyValue::new(CLOUD_REGION, region.clone()));
    }

    attrs
}

/// Extracts the queue name from an event source ARN.
///
/// ARN format: `arn:aws:sqs:{region}:{account}:{queue-name}`
pub fn destination_name(arn: &str) -> Option<&str> {
    arn.rsplit(':').next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::Value;

    const SQS_EVENT: &str = r#"{
      "Records": [
        {
          "messageId": "2e1424d4-f796-459a-8184-9c92662be6da",
          "receiptHandle": "AQEBzWwaftRI0KuVm4tP",
          "body": "Test message.",
          "attributes": {
            "ApproximateReceiveCount": "1",
            "SentTimestamp": "1545082650636",
            "SenderId": "AIDAIENQZJOLO23YVJ4VO",
            "ApproximateFirstReceiveTimestamp": "1545082650649"
          },
          "messageAttributes": {},
          "md5OfBody": "e4e68fb7bd0e697a0ae8f1bb342846b3",
          "eventSource": "aws:sqs",
          "eventSourceARN": "arn:aws:sqs:us-east-2:123456789012:my-queue",
          "awsRegion": "us-east-2"
        }
      ]
    }"#;

    fn test_event() -> SqsEvent {
        serde_json::from_str(SQS_EVENT).expect("valid JSON")
    }

    fn find<'a>(attrs: &'a [KeyValue], key: &str) -> Option<&'a Value> {
        attrs
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }

    #[test]
    fn test_span_name_includes_queue() {
        assert_eq!(span_name(&test_event()), "poll my-queue");
    }

    #[test]
    fn test_span_name_empty_batch() {
        let event = SqsEvent { records: vec![] };
        assert_eq!(span_name(&event), "poll");
    }

    #[test]
    fn test_batch_attributes() {
        let attrs = batch_attributes(&test_event());
        assert_eq!(
            find(&attrs, "messaging.operation.name"),
            Some(&Value::from("poll"))
        );
        assert_eq!(
            find(&attrs, "messaging.operation.type"),
            Some(&Value::from("receive"))
        );
        assert_eq!(
            find(&attrs, "messaging.system"),
            Some(&Value::from("aws_sqs"))
        );
        assert_eq!(
            find(&attrs, "messaging.batch.message_count"),
            Some(&Value::from(1_i64))
        );
    }

    #[test]
    fn test_record_attributes() {
        let event = test_event();
        let attrs = record_attributes(&event.records[0]);

        assert_eq!(
            find(&attrs, "messaging.message.id"),
            Some(&Value::from("2e1424d4-f796-459a-8184-9c92662be6da"))
        );
        assert_eq!(
            find(&attrs, "messaging.operation.name"),
            Some(&Value::from("process"))
        );
        assert_eq!(
            find(&attrs, "messaging.operation.type"),
            Some(&Value::from("process"))
        );
        assert_eq!(
            find(&attrs, "messaging.destination.name"),
            Some(&Value::from("my-queue"))
        );
        assert_eq!(
            find(&attrs, "messaging.destination.subscription.name"),
            Some(&Value::from("arn:aws:sqs:us-east-2:123456789012:my-queue"))
        );
        assert_eq!(find(&attrs, "cloud.region"), Some(&Value::from("us-east-2")));
    }

    #[test]
    fn test_record_attributes_omit_missing_fields() {
        let record = SqsMessage::default();
        let attrs = record_attributes(&record);

        assert!(find(&attrs, "messaging.message.id").is_none());
        assert!(find(&attrs, "messaging.destination.name").is_none());
        assert!(find(&attrs, "cloud.region").is_none());
        // Fixed attributes are always present.
        assert_eq!(
            find(&attrs, "messaging.system"),
            Some(&Value::from("aws_sqs"))
        );
    }

    #[test]
    fn test_destination_name() {
        assert_eq!(
            destination_name("arn:aws:sqs:us-east-1:123456789:my-queue"),
            Some("my-queue")
        );
        assert_eq!(
            destination_name("arn:aws:sqs:eu-west-1:987654321:orders.fifo"),
            Some("orders.fifo")
        );
    }
}

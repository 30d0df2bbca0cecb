//! Semantic-convention attribute extraction per event shape.
//!
//! Each extractor is a set of pure functions mapping a typed event (or its
//! response) to a fresh `Vec<KeyValue>`. Missing optional fields are omitted
//! from the result; no extractor returns an error.

pub mod rest_api;
pub mod sqs;

//! Ranging pipeline
//!
//! Producer side: [`run_producer`] reads frames and pushes them into an
//! [`IngestionBuffer`]. Consumer side: [`RangingPipeline::tick`] drains the
//! buffer, classifies, parses and averages.

pub mod aggregate;
pub mod buffer;
pub mod classify;
pub mod parse;
mod pipeline;
mod producer;

pub use aggregate::{aggregate_rato, aggregate_rrn, rato_failed, rrn_failed, AggregateResult};
pub use buffer::IngestionBuffer;
pub use classify::{classify, NotificationKind, ResponseClass, StagingBuckets};
pub use parse::{parse_rato, parse_rrn, ParseOutcome, RatoEntry, RrnEntry};
pub use pipeline::{PipelineOptions, RangingPipeline, TickReport};
pub use producer::{run_producer, ProducerStats};

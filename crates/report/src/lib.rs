//! Report assembly over the caliper analytics core.
//!
//! This crate turns filtered collections of batch metrics into the
//! figures the reporting pages show: correction analytics, evaluation
//! summaries, productivity stats, grouped rollups, fleet comparison and
//! export rows. Reading the batch collection is a synchronous boundary
//! behind [`source::MetricSource`]; rendering, persistence and file
//! streaming stay outside.

pub mod export;
pub mod fleet;
pub mod ingest;
pub mod query;
pub mod source;
pub mod summary;

pub use query::{MetricQuery, QualityFilter};
pub use source::{InMemorySource, MetricSource};

//! Pure analytics domain for the caliper thickness-control reporting engine.
//!
//! Everything in this crate is deterministic computation over immutable
//! inputs: no I/O, no logging, no shared state. The raw material is the
//! per-sample capture of a calendering batch (thickness readings plus
//! correction-trigger state, one tuple per tick); the outputs are batch
//! quality metrics, correction effectiveness estimates, threshold
//! evaluations, grouped rollups and fleet rankings.
//!
//! Persistence, transport and rendering live outside this crate and hand
//! data in through plain values.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod correction;
pub mod effectiveness;
pub mod error;
pub mod evaluation;
pub mod fleet;
pub mod metric;
pub mod sample;
pub mod series;
pub mod shift;
pub mod stats;
pub mod thickness;
pub mod types;

pub use config::AnalyticsConfig;
pub use error::CoreError;
pub use metric::{BatchMetric, MetricRow};
pub use sample::{CorrectionAction, Sample, Side};
pub use series::SampleSeries;
pub use shift::Shift;

//! The synchronous read boundary.
//!
//! The analytics engine never talks to storage directly; whatever owns
//! the batch collection implements [`MetricSource`] and hands filtered
//! rows over. The in-memory implementation backs tests and small tools.

use caliper_core::evaluation::EvaluationThresholds;
use caliper_core::metric::MetricRow;

use crate::query::MetricQuery;

/// Supplier of metric rows for one analytics request.
pub trait MetricSource {
    /// All rows matching the query, in storage order.
    fn metrics(&self, query: &MetricQuery) -> Vec<MetricRow>;
}

/// A plain in-memory collection of rows.
pub struct InMemorySource {
    rows: Vec<MetricRow>,
    thresholds: EvaluationThresholds,
}

impl InMemorySource {
    pub fn new(rows: Vec<MetricRow>, thresholds: EvaluationThresholds) -> Self {
        Self { rows, thresholds }
    }
}

impl MetricSource for InMemorySource {
    fn metrics(&self, query: &MetricQuery) -> Vec<MetricRow> {
        query.apply(&self.rows, &self.thresholds)
    }
}

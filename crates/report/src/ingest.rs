//! Capture ingestion: raw JSON capture to metric row.
//!
//! The persistence layer hands over the stored capture blob plus the
//! machine/recipe/batch records it joined; this module decodes, computes
//! the metric and reports data loss at the boundary. A batch whose
//! capture is unusable still produces a (flagged) row — operators must
//! see it in listings rather than wonder where it went.

use serde_json::Value;
use tracing::{debug, warn};

use caliper_core::batch::{BatchInfo, Machine, Recipe};
use caliper_core::config::AnalyticsConfig;
use caliper_core::error::CoreError;
use caliper_core::metric::{compute_metric, BatchMetric, MetricRow};
use caliper_core::series::{decode_series, SampleSeries};
use caliper_core::shift::Shift;
use caliper_core::types::Timestamp;

/// One ingested batch: the metric row plus the decoded series (kept for
/// per-sample exports and effectiveness analysis).
#[derive(Debug)]
pub struct IngestedBatch {
    pub row: MetricRow,
    pub series: Option<SampleSeries>,
    /// Malformed tuples dropped during decoding.
    pub skipped: usize,
}

/// Decode one stored capture and compute its metric row.
///
/// `captured_at` is the batch completion time from the store; it anchors
/// the row when the capture itself is empty or unusable. Fails only on a
/// structurally invalid capture (not an array) or a disordered one —
/// individual bad tuples are skipped and counted.
pub fn ingest_capture(
    raw: &Value,
    machine: Machine,
    recipe: Option<Recipe>,
    batch: Option<BatchInfo>,
    captured_at: Timestamp,
    config: &AnalyticsConfig,
) -> Result<IngestedBatch, CoreError> {
    let outcome = decode_series(raw)?;
    if outcome.skipped > 0 {
        warn!(
            line = machine.line,
            skipped = outcome.skipped,
            decoded = outcome.decoded,
            "skipped malformed samples while decoding capture"
        );
    }

    let row = match &outcome.series {
        Some(series) => {
            let metric = compute_metric(series, config);
            debug!(
                line = machine.line,
                samples = metric.sample_count,
                insufficient = metric.insufficient_data,
                "capture ingested"
            );
            MetricRow {
                machine,
                recipe,
                batch,
                started_at: series.started_at(),
                ended_at: series.ended_at(),
                shift: series.shift(),
                metric,
            }
        }
        None => {
            warn!(line = machine.line, "capture held no usable samples");
            MetricRow {
                machine,
                recipe,
                batch,
                started_at: captured_at,
                ended_at: captured_at,
                shift: Shift::from_timestamp(captured_at),
                metric: BatchMetric::missing(),
            }
        }
    };

    Ok(IngestedBatch {
        row,
        series: outcome.series,
        skipped: outcome.skipped,
    })
}

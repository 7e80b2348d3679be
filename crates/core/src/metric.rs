//! Per-batch metric assembly.
//!
//! A [`BatchMetric`] is a pure derivation from a sample series: computing
//! it twice from the same series yields identical output, and nothing is
//! cached or mutated. A batch whose capture is missing or too thin still
//! gets a metric — zeroed and flagged — so it stays visible in listings
//! while rollups know to leave it out of their averages.

use serde::{Deserialize, Serialize};

use crate::batch::{BatchInfo, Machine, Recipe};
use crate::config::AnalyticsConfig;
use crate::correction::{self, CorrectionBreakdown};
use crate::evaluation::{
    self, BatchEvaluations, EvaluationThresholds, QualityStatus,
};
use crate::series::SampleSeries;
use crate::shift::Shift;
use crate::thickness;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// BatchMetric
// ---------------------------------------------------------------------------

/// Scalar quality metrics of one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetric {
    pub t_avg_left: f64,
    pub t_avg_right: f64,
    pub t_avg: f64,
    pub t_mae_left: f64,
    pub t_mae_right: f64,
    pub t_mae: f64,
    pub t_ssd_left: f64,
    pub t_ssd_right: f64,
    pub t_ssd: f64,
    /// `t_avg_left - t_avg_right`, signed, never clamped.
    pub t_balance: f64,
    /// % of samples during which automatic correction was active.
    pub correction_uptime: f64,
    /// % of samples with an active trigger on either side.
    pub correction_rate: f64,
    pub corrections_left: usize,
    pub corrections_right: usize,
    pub correction_breakdown: CorrectionBreakdown,
    /// Decoded samples that fed the metric.
    pub sample_count: usize,
    /// Set when the capture was missing or below the configured sample
    /// floor. Flagged batches stay in listings but are excluded from
    /// rollup averages and good-counts.
    pub insufficient_data: bool,
}

impl BatchMetric {
    /// Metric for a batch with no usable capture at all.
    pub fn missing() -> Self {
        Self {
            t_avg_left: 0.0,
            t_avg_right: 0.0,
            t_avg: 0.0,
            t_mae_left: 0.0,
            t_mae_right: 0.0,
            t_mae: 0.0,
            t_ssd_left: 0.0,
            t_ssd_right: 0.0,
            t_ssd: 0.0,
            t_balance: 0.0,
            correction_uptime: 0.0,
            correction_rate: 0.0,
            corrections_left: 0,
            corrections_right: 0,
            correction_breakdown: CorrectionBreakdown::default(),
            sample_count: 0,
            insufficient_data: true,
        }
    }

    /// Evaluate all four dimensions against the configured thresholds.
    pub fn evaluations(&self, thresholds: &EvaluationThresholds) -> BatchEvaluations {
        BatchEvaluations {
            balance: evaluation::evaluate_balance(self.t_balance, thresholds),
            mae: evaluation::evaluate_mae(self.t_mae, thresholds),
            ssd: evaluation::evaluate_ssd(self.t_ssd, thresholds),
            correction: evaluation::evaluate_correction(self.correction_uptime, thresholds),
        }
    }

    /// Gating pass/fail label (MAE only).
    pub fn quality_status(&self, thresholds: &EvaluationThresholds) -> QualityStatus {
        evaluation::quality_status(self.t_mae, thresholds)
    }
}

/// Compute the metric of one batch from its series.
pub fn compute_metric(series: &SampleSeries, config: &AnalyticsConfig) -> BatchMetric {
    let t = thickness::summarize(series);
    let c = correction::track(series);

    BatchMetric {
        t_avg_left: t.left.avg,
        t_avg_right: t.right.avg,
        t_avg: t.avg,
        t_mae_left: t.left.mae,
        t_mae_right: t.right.mae,
        t_mae: t.mae,
        t_ssd_left: t.left.ssd,
        t_ssd_right: t.right.ssd,
        t_ssd: t.ssd,
        t_balance: t.balance,
        correction_uptime: c.uptime_pct,
        correction_rate: c.rate_pct,
        corrections_left: c.corrections_left,
        corrections_right: c.corrections_right,
        correction_breakdown: c.breakdown,
        sample_count: series.len(),
        insufficient_data: series.len() < config.min_samples
            || (t.left.reading_count == 0 && t.right.reading_count == 0),
    }
}

// ---------------------------------------------------------------------------
// MetricRow
// ---------------------------------------------------------------------------

/// One batch's metric together with its identity context — the unit the
/// query layer, aggregator and exports operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub machine: Machine,
    pub recipe: Option<Recipe>,
    pub batch: Option<BatchInfo>,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub shift: Shift,
    pub metric: BatchMetric,
}

impl MetricRow {
    pub fn recipe_id(&self) -> Option<DbId> {
        self.recipe.as_ref().map(|r| r.id)
    }

    pub fn recipe_name(&self) -> Option<&str> {
        self.recipe.as_ref().map(|r| r.name.as_str())
    }

    pub fn batch_code(&self) -> Option<&str> {
        self.batch.as_ref().map(|b| b.code.as_str())
    }

    pub fn mcs(&self) -> Option<&str> {
        self.batch.as_ref().and_then(|b| b.mcs.as_deref())
    }

    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

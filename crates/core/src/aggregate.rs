//! Multi-key rollups over batch metrics.
//!
//! Groups are query-scoped artifacts: rebuilt per request, never stored.
//! Batches flagged `insufficient_data` are counted in the group but left
//! out of every average and good-count, so a thin capture can never read
//! as a zero-quality batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationThresholds;
use crate::metric::MetricRow;
use crate::stats::{consistency_score, mean, percentage};

// ---------------------------------------------------------------------------
// Grouping dimensions
// ---------------------------------------------------------------------------

/// The four grouping keys the reports offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDimension {
    Date,
    Shift,
    MachineLine,
    Recipe,
}

impl GroupDimension {
    /// The grouping key of one row under this dimension.
    pub fn key_of(self, row: &MetricRow) -> String {
        match self {
            Self::Date => row.started_at.date().format("%Y-%m-%d").to_string(),
            Self::Shift => row.shift.number().to_string(),
            Self::MachineLine => format!("{:02}", row.machine.line),
            Self::Recipe => row
                .recipe_name()
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// Per-dimension good counts within one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GoodCounts {
    pub balance: usize,
    pub mae: usize,
    pub ssd: usize,
    pub correction: usize,
}

/// Rolled-up statistics for one group of batches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateBucket {
    pub key: String,
    /// Every batch that fell into the group, including flagged ones.
    pub batch_count: usize,
    /// Batches with sufficient data; denominators for all percentages.
    pub evaluated_count: usize,
    pub avg_thickness: f64,
    pub avg_mae: f64,
    pub avg_ssd: f64,
    pub avg_balance: f64,
    pub avg_uptime: f64,
    pub avg_rate: f64,
    pub good: GoodCounts,
    pub balance_good_pct: f64,
    pub mae_good_pct: f64,
    pub ssd_good_pct: f64,
    pub correction_good_pct: f64,
    /// Process-quality composite: equal-weighted mean of the four
    /// good-percentages.
    pub overall_performance: f64,
    /// `max(0, 100 - CV(MAE) * 100)`; 100 for groups of one.
    pub consistency_score: f64,
    /// Batches good on all four dimensions at once.
    pub target_achievement_count: usize,
    pub target_achievement_pct: f64,
}

// ---------------------------------------------------------------------------
// Composite score
// ---------------------------------------------------------------------------

/// Process-quality overall performance: the equal-weighted mean of the
/// four per-dimension good-percentages.
///
/// This is deliberately a separate function from the fleet-comparison
/// score in [`crate::fleet`]; the two formulas serve different reports
/// and must not be unified.
pub fn process_quality_score(
    balance_good_pct: f64,
    mae_good_pct: f64,
    ssd_good_pct: f64,
    correction_good_pct: f64,
) -> f64 {
    (balance_good_pct + mae_good_pct + ssd_good_pct + correction_good_pct) / 4.0
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group rows by an arbitrary key and roll each group up.
///
/// Buckets come back ordered by key.
pub fn aggregate_with<F>(
    rows: &[MetricRow],
    thresholds: &EvaluationThresholds,
    key_fn: F,
) -> Vec<AggregateBucket>
where
    F: Fn(&MetricRow) -> String,
{
    let mut groups: BTreeMap<String, Vec<&MetricRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(key_fn(row)).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(key, members)| roll_up(key, &members, thresholds))
        .collect()
}

/// Group rows by one of the standard dimensions.
pub fn aggregate_by(
    rows: &[MetricRow],
    thresholds: &EvaluationThresholds,
    dimension: GroupDimension,
) -> Vec<AggregateBucket> {
    aggregate_with(rows, thresholds, |row| dimension.key_of(row))
}

fn roll_up(key: String, members: &[&MetricRow], thresholds: &EvaluationThresholds) -> AggregateBucket {
    let evaluated: Vec<&MetricRow> = members
        .iter()
        .copied()
        .filter(|row| !row.metric.insufficient_data)
        .collect();
    let evaluated_count = evaluated.len();

    let mut good = GoodCounts::default();
    let mut target_achievement_count = 0usize;
    for row in &evaluated {
        let evaluations = row.metric.evaluations(thresholds);
        if evaluations.balance.is_good {
            good.balance += 1;
        }
        if evaluations.mae.is_good {
            good.mae += 1;
        }
        if evaluations.ssd.is_good {
            good.ssd += 1;
        }
        if evaluations.correction.is_good {
            good.correction += 1;
        }
        if evaluations.all_good() {
            target_achievement_count += 1;
        }
    }

    let mae_values: Vec<f64> = evaluated.iter().map(|row| row.metric.t_mae).collect();

    let balance_good_pct = percentage(good.balance, evaluated_count);
    let mae_good_pct = percentage(good.mae, evaluated_count);
    let ssd_good_pct = percentage(good.ssd, evaluated_count);
    let correction_good_pct = percentage(good.correction, evaluated_count);

    AggregateBucket {
        key,
        batch_count: members.len(),
        evaluated_count,
        avg_thickness: mean(&collect(&evaluated, |m| m.t_avg)),
        avg_mae: mean(&mae_values),
        avg_ssd: mean(&collect(&evaluated, |m| m.t_ssd)),
        avg_balance: mean(&collect(&evaluated, |m| m.t_balance)),
        avg_uptime: mean(&collect(&evaluated, |m| m.correction_uptime)),
        avg_rate: mean(&collect(&evaluated, |m| m.correction_rate)),
        good,
        balance_good_pct,
        mae_good_pct,
        ssd_good_pct,
        correction_good_pct,
        overall_performance: process_quality_score(
            balance_good_pct,
            mae_good_pct,
            ssd_good_pct,
            correction_good_pct,
        ),
        consistency_score: consistency_score(&mae_values),
        target_achievement_count,
        target_achievement_pct: percentage(target_achievement_count, evaluated_count),
    }
}

fn collect(rows: &[&MetricRow], field: impl Fn(&crate::metric::BatchMetric) -> f64) -> Vec<f64> {
    rows.iter().map(|row| field(&row.metric)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

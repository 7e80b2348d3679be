//! Fleet comparison: score and rank every machine over a query period.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use caliper_core::error::CoreError;
use caliper_core::evaluation::{EvaluationThresholds, QualityStatus};
use caliper_core::fleet::{fleet_performance_score, rank_by_score, FleetWeights, Ranked};
use caliper_core::metric::MetricRow;
use caliper_core::stats::{consistency_score, mean, percentage};

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One machine's fleet-comparison inputs, all on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetEntry {
    pub machine_line: i32,
    pub batch_count: usize,
    /// MAE pass rate over the period, %.
    pub quality_score: f64,
    /// Distinct production days over the period days, %.
    pub utilization: f64,
    /// Mean correction uptime, %.
    pub availability: f64,
    /// MAE consistency (100 - CV * 100, floored at 0).
    pub consistency: f64,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Score every machine in the row set and rank the fleet.
///
/// `period_days` is the length of the queried range (both ends
/// inclusive); it anchors utilization. Weight validation is fatal.
pub fn fleet_comparison(
    rows: &[MetricRow],
    period_days: i64,
    thresholds: &EvaluationThresholds,
    weights: &FleetWeights,
) -> Result<Vec<Ranked<FleetEntry>>, CoreError> {
    weights.validate()?;
    let period_days = period_days.max(1);

    let mut groups: BTreeMap<i32, Vec<&MetricRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.machine.line).or_default().push(row);
    }

    let entries: Vec<FleetEntry> = groups
        .into_iter()
        .map(|(machine_line, members)| {
            let batch_count = members.len();
            let evaluated: Vec<&&MetricRow> = members
                .iter()
                .filter(|row| !row.metric.insufficient_data)
                .collect();

            let passed = evaluated
                .iter()
                .filter(|row| row.metric.quality_status(thresholds) == QualityStatus::Pass)
                .count();

            let production_days = members
                .iter()
                .map(|row| row.started_at.date())
                .collect::<std::collections::BTreeSet<_>>()
                .len();

            let mae_values: Vec<f64> =
                evaluated.iter().map(|row| row.metric.t_mae).collect();
            let uptimes: Vec<f64> = evaluated
                .iter()
                .map(|row| row.metric.correction_uptime)
                .collect();

            FleetEntry {
                machine_line,
                batch_count,
                quality_score: percentage(passed, evaluated.len()),
                utilization: (production_days as f64 / period_days as f64 * 100.0).min(100.0),
                availability: mean(&uptimes),
                consistency: consistency_score(&mae_values),
            }
        })
        .collect();

    debug!(machines = entries.len(), "fleet comparison assembled");

    Ok(rank_by_score(entries, |entry| {
        fleet_performance_score(
            entry.quality_score,
            entry.utilization,
            entry.availability,
            entry.consistency,
            weights,
        )
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

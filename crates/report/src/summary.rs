//! Report summaries assembled from filtered metric rows.
//!
//! Each function here backs one block of a reporting page: the
//! correction analytics cards, the evaluation distribution, the
//! productivity figures and the grouped trend tables. Batches flagged
//! `insufficient_data` count toward totals but never toward averages or
//! classifications.

use std::collections::BTreeMap;

use serde::Serialize;

use caliper_core::aggregate::{aggregate_with, AggregateBucket};
use caliper_core::effectiveness::{analyze_series, LookaheadWindow};
use caliper_core::evaluation::{EvaluationThresholds, QualityStatus};
use caliper_core::metric::MetricRow;
use caliper_core::series::SampleSeries;
use caliper_core::stats::{consistency_score, mean, percentage};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn evaluated(rows: &[MetricRow]) -> Vec<&MetricRow> {
    rows.iter()
        .filter(|row| !row.metric.insufficient_data)
        .collect()
}

fn is_auto(row: &MetricRow, thresholds: &EvaluationThresholds) -> bool {
    row.metric.correction_uptime > thresholds.auto_uptime_pct
}

/// Percentage of evaluated batches passing the MAE quality gate.
pub fn quality_pass_rate(rows: &[MetricRow], thresholds: &EvaluationThresholds) -> f64 {
    let rows = evaluated(rows);
    let passed = rows
        .iter()
        .filter(|row| row.metric.quality_status(thresholds) == QualityStatus::Pass)
        .count();
    percentage(passed, rows.len())
}

// ---------------------------------------------------------------------------
// Correction analytics
// ---------------------------------------------------------------------------

/// Correction rate above which a batch counts as heavily corrected.
pub const HIGH_CORRECTION_RATE_PCT: f64 = 20.0;

/// Headline figures of the correction analytics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionStats {
    pub total_batches: usize,
    pub auto_batches: usize,
    pub manual_batches: usize,
    pub auto_pct: f64,
    pub avg_correction_uptime: f64,
    pub avg_correction_rate: f64,
    pub corrections_left: usize,
    pub corrections_right: usize,
    pub total_corrections: usize,
    /// MAE improvement of heavily corrected batches over the overall
    /// average, %, floored at 0.
    pub correction_effectiveness: f64,
}

/// Compute the correction analytics headline block.
pub fn correction_stats(rows: &[MetricRow], thresholds: &EvaluationThresholds) -> CorrectionStats {
    let rows_evaluated = evaluated(rows);
    let auto_batches = rows_evaluated
        .iter()
        .filter(|row| is_auto(row, thresholds))
        .count();
    let manual_batches = rows_evaluated.len() - auto_batches;

    let corrections_left: usize = rows_evaluated
        .iter()
        .map(|row| row.metric.corrections_left)
        .sum();
    let corrections_right: usize = rows_evaluated
        .iter()
        .map(|row| row.metric.corrections_right)
        .sum();

    CorrectionStats {
        total_batches: rows.len(),
        auto_batches,
        manual_batches,
        auto_pct: percentage(auto_batches, rows_evaluated.len()),
        avg_correction_uptime: mean(
            &rows_evaluated
                .iter()
                .map(|row| row.metric.correction_uptime)
                .collect::<Vec<_>>(),
        ),
        avg_correction_rate: mean(
            &rows_evaluated
                .iter()
                .map(|row| row.metric.correction_rate)
                .collect::<Vec<_>>(),
        ),
        corrections_left,
        corrections_right,
        total_corrections: corrections_left + corrections_right,
        correction_effectiveness: correction_effectiveness(rows),
    }
}

/// MAE improvement of heavily corrected batches relative to the overall
/// average: `(overall_mae - high_correction_mae) / overall_mae * 100`,
/// floored at 0. Returns 0 when no batch is heavily corrected or the
/// overall average is 0.
pub fn correction_effectiveness(rows: &[MetricRow]) -> f64 {
    let rows = evaluated(rows);
    let high: Vec<f64> = rows
        .iter()
        .filter(|row| row.metric.correction_rate > HIGH_CORRECTION_RATE_PCT)
        .map(|row| row.metric.t_mae)
        .collect();
    if high.is_empty() {
        return 0.0;
    }

    let overall = mean(&rows.iter().map(|row| row.metric.t_mae).collect::<Vec<_>>());
    if overall == 0.0 {
        return 0.0;
    }

    (((overall - mean(&high)) / overall) * 100.0).max(0.0)
}

/// Correction efficiency of a set of batches: automation balanced
/// against outcome quality, penalized by trigger churn.
/// `uptime*0.4 + pass_rate*0.6 - rate*0.1`, clamped to [0, 100].
pub fn correction_efficiency(rows: &[MetricRow], thresholds: &EvaluationThresholds) -> f64 {
    let rows_evaluated = evaluated(rows);
    let avg_uptime = mean(
        &rows_evaluated
            .iter()
            .map(|row| row.metric.correction_uptime)
            .collect::<Vec<_>>(),
    );
    let avg_rate = mean(
        &rows_evaluated
            .iter()
            .map(|row| row.metric.correction_rate)
            .collect::<Vec<_>>(),
    );
    let pass_rate = quality_pass_rate(rows, thresholds);

    (avg_uptime * 0.4 + pass_rate * 0.6 - avg_rate * 0.1).clamp(0.0, 100.0)
}

/// MAE improvement of auto batches over manual ones, %. Returns 0 when
/// either mode is absent or manual quality is 0.
pub fn quality_improvement(rows: &[MetricRow], thresholds: &EvaluationThresholds) -> f64 {
    let rows = evaluated(rows);
    let auto: Vec<f64> = rows
        .iter()
        .filter(|row| is_auto(row, thresholds))
        .map(|row| row.metric.t_mae)
        .collect();
    let manual: Vec<f64> = rows
        .iter()
        .filter(|row| !is_auto(row, thresholds))
        .map(|row| row.metric.t_mae)
        .collect();

    if auto.is_empty() || manual.is_empty() {
        return 0.0;
    }
    let manual_mae = mean(&manual);
    if manual_mae == 0.0 {
        return 0.0;
    }
    (manual_mae - mean(&auto)) / manual_mae * 100.0
}

// ---------------------------------------------------------------------------
// Trigger effectiveness overview
// ---------------------------------------------------------------------------

/// Look-ahead effectiveness rolled up over many batches' series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectivenessOverview {
    /// Triggers whose effect could be measured.
    pub measured_triggers: usize,
    /// Triggers excluded because the series ended inside the window.
    pub unmeasured_triggers: usize,
    pub avg_change_mm: f64,
    pub avg_change_pct: f64,
}

/// Roll up per-trigger effectiveness across a set of series.
pub fn effectiveness_overview(
    series_list: &[&SampleSeries],
    window: &LookaheadWindow,
) -> EffectivenessOverview {
    let mut changes_mm = Vec::new();
    let mut changes_pct = Vec::new();
    let mut total_triggers = 0usize;

    for series in series_list {
        total_triggers += series
            .samples()
            .iter()
            .map(|s| {
                s.action_left.is_active() as usize + s.action_right.is_active() as usize
            })
            .sum::<usize>();
        for effect in analyze_series(series, window) {
            changes_mm.push(effect.change_mm);
            changes_pct.push(effect.change_pct);
        }
    }

    EffectivenessOverview {
        measured_triggers: changes_mm.len(),
        unmeasured_triggers: total_triggers - changes_mm.len(),
        avg_change_mm: mean(&changes_mm),
        avg_change_pct: mean(&changes_pct),
    }
}

// ---------------------------------------------------------------------------
// Evaluation summary
// ---------------------------------------------------------------------------

/// Ungrouped evaluation rollup of a whole result set: one bucket
/// spanning every row.
pub fn evaluation_summary(
    rows: &[MetricRow],
    thresholds: &EvaluationThresholds,
) -> AggregateBucket {
    let mut buckets = aggregate_with(rows, thresholds, |_| "all".to_string());
    if buckets.is_empty() {
        // An empty result set still renders a (zeroed) summary card.
        return AggregateBucket {
            key: "all".to_string(),
            batch_count: 0,
            evaluated_count: 0,
            avg_thickness: 0.0,
            avg_mae: 0.0,
            avg_ssd: 0.0,
            avg_balance: 0.0,
            avg_uptime: 0.0,
            avg_rate: 0.0,
            good: Default::default(),
            balance_good_pct: 0.0,
            mae_good_pct: 0.0,
            ssd_good_pct: 0.0,
            correction_good_pct: 0.0,
            overall_performance: 0.0,
            consistency_score: 100.0,
            target_achievement_count: 0,
            target_achievement_pct: 0.0,
        };
    }
    buckets.remove(0)
}

// ---------------------------------------------------------------------------
// Productivity
// ---------------------------------------------------------------------------

/// Throughput figures over the query period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProductivityStats {
    pub total_batches: usize,
    pub batches_per_hour: f64,
    pub daily_average: f64,
    /// Largest batch count of any single clock hour.
    pub peak_hour_production: usize,
    /// 100 - CV of daily batch counts, floored at 0; 100 for one day.
    pub production_consistency: f64,
}

/// Compute productivity stats for rows inside `[start, end]` (both
/// inclusive; `period_days` as reported by the query).
pub fn productivity_stats(rows: &[MetricRow], period_days: i64) -> ProductivityStats {
    let days = period_days.max(1);
    let hours = days * 24;

    let mut per_day: BTreeMap<String, usize> = BTreeMap::new();
    let mut per_hour: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        *per_day
            .entry(row.started_at.date().format("%Y-%m-%d").to_string())
            .or_default() += 1;
        *per_hour
            .entry(row.started_at.format("%Y-%m-%d %H").to_string())
            .or_default() += 1;
    }

    let daily_counts: Vec<f64> = per_day.values().map(|&c| c as f64).collect();

    ProductivityStats {
        total_batches: rows.len(),
        batches_per_hour: rows.len() as f64 / hours as f64,
        daily_average: rows.len() as f64 / days as f64,
        peak_hour_production: per_hour.values().copied().max().unwrap_or(0),
        production_consistency: consistency_score(&daily_counts),
    }
}

// ---------------------------------------------------------------------------
// Daily correction trend
// ---------------------------------------------------------------------------

/// One day of the correction-trend table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCorrectionRow {
    pub date: String,
    pub batch_count: usize,
    pub avg_correction_uptime: f64,
    pub avg_correction_rate: f64,
    pub auto_pct: f64,
    pub avg_mae: f64,
    pub corrections_left: usize,
    pub corrections_right: usize,
}

/// Per-day correction activity, ordered by date.
pub fn daily_correction_trend(
    rows: &[MetricRow],
    thresholds: &EvaluationThresholds,
) -> Vec<DailyCorrectionRow> {
    let mut groups: BTreeMap<String, Vec<&MetricRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.started_at.date().format("%Y-%m-%d").to_string())
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|(date, members)| {
            let batch_count = members.len();
            let members: Vec<&MetricRow> = members
                .into_iter()
                .filter(|row| !row.metric.insufficient_data)
                .collect();
            let auto = members
                .iter()
                .filter(|row| is_auto(row, thresholds))
                .count();
            DailyCorrectionRow {
                date,
                batch_count,
                avg_correction_uptime: mean(
                    &members
                        .iter()
                        .map(|row| row.metric.correction_uptime)
                        .collect::<Vec<_>>(),
                ),
                avg_correction_rate: mean(
                    &members
                        .iter()
                        .map(|row| row.metric.correction_rate)
                        .collect::<Vec<_>>(),
                ),
                auto_pct: percentage(auto, members.len()),
                avg_mae: mean(&members.iter().map(|row| row.metric.t_mae).collect::<Vec<_>>()),
                corrections_left: members.iter().map(|row| row.metric.corrections_left).sum(),
                corrections_right: members.iter().map(|row| row.metric.corrections_right).sum(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Machine correction comparison
// ---------------------------------------------------------------------------

/// One machine of the correction comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineCorrectionRow {
    pub machine_line: i32,
    pub batch_count: usize,
    pub auto_pct: f64,
    pub avg_correction_uptime: f64,
    pub avg_correction_rate: f64,
    pub correction_efficiency: f64,
    pub quality_improvement: f64,
}

/// Per-machine correction comparison, ordered by line number.
pub fn machine_correction_comparison(
    rows: &[MetricRow],
    thresholds: &EvaluationThresholds,
) -> Vec<MachineCorrectionRow> {
    let mut groups: BTreeMap<i32, Vec<MetricRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.machine.line).or_default().push(row.clone());
    }

    groups
        .into_iter()
        .map(|(machine_line, members)| {
            let stats = correction_stats(&members, thresholds);
            MachineCorrectionRow {
                machine_line,
                batch_count: members.len(),
                auto_pct: stats.auto_pct,
                avg_correction_uptime: stats.avg_correction_uptime,
                avg_correction_rate: stats.avg_correction_rate,
                correction_efficiency: correction_efficiency(&members, thresholds),
                quality_improvement: quality_improvement(&members, thresholds),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use caliper_core::batch::Machine;
    use caliper_core::metric::BatchMetric;
    use caliper_core::sample::{CorrectionAction, Sample};
    use caliper_core::series::SampleSeries;
    use caliper_core::shift::Shift;
    use chrono::NaiveDate;

    fn row(day: u32, line: i32, mae: f64, uptime: f64, rate: f64) -> MetricRow {
        let started_at = NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        MetricRow {
            machine: Machine {
                id: line as i64,
                line,
            },
            recipe: None,
            batch: None,
            started_at,
            ended_at: started_at + chrono::Duration::minutes(30),
            shift: Shift::from_timestamp(started_at),
            metric: BatchMetric {
                t_mae: mae,
                t_mae_left: mae,
                t_mae_right: mae,
                correction_uptime: uptime,
                correction_rate: rate,
                corrections_left: 2,
                corrections_right: 3,
                sample_count: 50,
                insufficient_data: false,
                ..BatchMetric::missing()
            },
        }
    }

    fn flagged(day: u32) -> MetricRow {
        let mut r = row(day, 1, 0.0, 0.0, 0.0);
        r.metric = BatchMetric::missing();
        r
    }

    // -- correction_stats -----------------------------------------------------

    #[test]
    fn auto_manual_split_uses_uptime_threshold() {
        let rows = vec![
            row(1, 1, 0.5, 80.0, 10.0),
            row(1, 1, 0.5, 50.0, 10.0),
            row(1, 1, 0.5, 20.0, 10.0),
        ];
        let stats = correction_stats(&rows, &EvaluationThresholds::default());
        assert_eq!(stats.auto_batches, 1);
        assert_eq!(stats.manual_batches, 2);
        assert!((stats.auto_pct - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn correction_totals_sum_both_sides() {
        let rows = vec![row(1, 1, 0.5, 80.0, 10.0), row(1, 1, 0.5, 80.0, 10.0)];
        let stats = correction_stats(&rows, &EvaluationThresholds::default());
        assert_eq!(stats.corrections_left, 4);
        assert_eq!(stats.corrections_right, 6);
        assert_eq!(stats.total_corrections, 10);
    }

    #[test]
    fn flagged_rows_count_toward_total_only() {
        let rows = vec![row(1, 1, 0.5, 80.0, 10.0), flagged(1)];
        let stats = correction_stats(&rows, &EvaluationThresholds::default());
        assert_eq!(stats.total_batches, 2);
        assert_eq!(stats.auto_batches + stats.manual_batches, 1);
        assert!((stats.avg_correction_uptime - 80.0).abs() < 1e-9);
    }

    // -- correction_effectiveness ---------------------------------------------

    #[test]
    fn effectiveness_rewards_better_corrected_batches() {
        // Heavily corrected batches run cleaner than the overall mean.
        let rows = vec![
            row(1, 1, 0.4, 80.0, 30.0),
            row(1, 1, 0.8, 80.0, 5.0),
            row(1, 1, 1.2, 80.0, 5.0),
        ];
        // overall 0.8, high-correction 0.4 -> 50% improvement.
        assert!((correction_effectiveness(&rows) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn effectiveness_is_floored_at_zero() {
        let rows = vec![row(1, 1, 1.2, 80.0, 30.0), row(1, 1, 0.4, 80.0, 5.0)];
        assert_eq!(correction_effectiveness(&rows), 0.0);
    }

    #[test]
    fn effectiveness_without_high_correction_batches_is_zero() {
        let rows = vec![row(1, 1, 0.5, 80.0, 5.0)];
        assert_eq!(correction_effectiveness(&rows), 0.0);
    }

    // -- correction_efficiency ------------------------------------------------

    #[test]
    fn efficiency_formula() {
        let rows = vec![row(1, 1, 0.5, 80.0, 10.0)];
        // 80*0.4 + 100*0.6 - 10*0.1 = 91.0
        let eff = correction_efficiency(&rows, &EvaluationThresholds::default());
        assert!((eff - 91.0).abs() < 1e-9);
    }

    #[test]
    fn efficiency_is_clamped() {
        let rows = vec![row(1, 1, 5.0, 0.0, 100.0)];
        // 0*0.4 + 0*0.6 - 100*0.1 = -10 -> clamp to 0.
        assert_eq!(
            correction_efficiency(&rows, &EvaluationThresholds::default()),
            0.0
        );
    }

    // -- quality_improvement --------------------------------------------------

    #[test]
    fn improvement_compares_auto_and_manual() {
        let rows = vec![row(1, 1, 0.4, 80.0, 10.0), row(1, 1, 0.8, 20.0, 10.0)];
        // (0.8 - 0.4) / 0.8 = 50%.
        assert!((quality_improvement(&rows, &EvaluationThresholds::default()) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn improvement_needs_both_modes() {
        let rows = vec![row(1, 1, 0.4, 80.0, 10.0)];
        assert_eq!(
            quality_improvement(&rows, &EvaluationThresholds::default()),
            0.0
        );
    }

    // -- effectiveness_overview -----------------------------------------------

    fn trigger_series() -> SampleSeries {
        let base = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let readings = [2.0, 2.0, 2.0, 2.5, 3.0, 3.0, 3.0, 3.0, 3.0, 2.9];
        let samples = readings
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample {
                taken_at: base + chrono::Duration::seconds(i as i64),
                is_correcting: i == 0,
                // Trigger at index 0 is measurable; the one at the tail
                // runs out of series.
                action_left: if i == 0 || i == 9 {
                    CorrectionAction::Thin
                } else {
                    CorrectionAction::None
                },
                action_right: CorrectionAction::None,
                sensor_left: v,
                sensor_right: v,
                recipe_id: None,
                std_min: None,
                std_max: None,
                std_mid: Some(3.0),
            })
            .collect();
        SampleSeries::new(samples).unwrap()
    }

    #[test]
    fn overview_separates_measured_and_unmeasured() {
        let series = trigger_series();
        let overview =
            effectiveness_overview(&[&series], &LookaheadWindow::default());
        assert_eq!(overview.measured_triggers, 1);
        assert_eq!(overview.unmeasured_triggers, 1);
        // Baseline 2.0, settled at offset 3 (value 2.5): 0.5 mm.
        assert!((overview.avg_change_mm - 0.5).abs() < 1e-12);
    }

    // -- evaluation_summary ---------------------------------------------------

    #[test]
    fn summary_spans_all_rows() {
        let rows = vec![row(1, 1, 0.5, 80.0, 10.0), row(2, 2, 1.5, 20.0, 10.0)];
        let bucket = evaluation_summary(&rows, &EvaluationThresholds::default());
        assert_eq!(bucket.batch_count, 2);
        assert_eq!(bucket.good.mae, 1);
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        let bucket = evaluation_summary(&[], &EvaluationThresholds::default());
        assert_eq!(bucket.batch_count, 0);
        assert_eq!(bucket.overall_performance, 0.0);
    }

    // -- productivity ---------------------------------------------------------

    #[test]
    fn productivity_counts_days_and_hours() {
        let rows = vec![
            row(1, 1, 0.5, 80.0, 10.0),
            row(1, 1, 0.5, 80.0, 10.0),
            row(2, 1, 0.5, 80.0, 10.0),
        ];
        let stats = productivity_stats(&rows, 2);
        assert_eq!(stats.total_batches, 3);
        assert!((stats.daily_average - 1.5).abs() < 1e-12);
        assert!((stats.batches_per_hour - 3.0 / 48.0).abs() < 1e-12);
        // Two batches share the same clock hour on day 1.
        assert_eq!(stats.peak_hour_production, 2);
    }

    #[test]
    fn productivity_consistency_is_hundred_for_single_day() {
        let rows = vec![row(1, 1, 0.5, 80.0, 10.0)];
        let stats = productivity_stats(&rows, 1);
        assert_eq!(stats.production_consistency, 100.0);
    }

    // -- daily trend ----------------------------------------------------------

    #[test]
    fn daily_trend_orders_by_date() {
        let rows = vec![
            row(2, 1, 0.5, 80.0, 10.0),
            row(1, 1, 0.5, 80.0, 10.0),
            row(1, 1, 0.5, 20.0, 10.0),
        ];
        let trend = daily_correction_trend(&rows, &EvaluationThresholds::default());
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, "2025-05-01");
        assert_eq!(trend[0].batch_count, 2);
        assert!((trend[0].auto_pct - 50.0).abs() < 1e-9);
        assert_eq!(trend[0].corrections_left, 4);
    }

    // -- machine comparison ---------------------------------------------------

    #[test]
    fn machine_comparison_orders_by_line() {
        let rows = vec![
            row(1, 4, 0.5, 80.0, 10.0),
            row(1, 2, 0.5, 80.0, 10.0),
            row(1, 2, 0.5, 20.0, 10.0),
        ];
        let comparison = machine_correction_comparison(&rows, &EvaluationThresholds::default());
        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison[0].machine_line, 2);
        assert_eq!(comparison[0].batch_count, 2);
        assert_eq!(comparison[1].machine_line, 4);
    }
}

//! Export row construction.
//!
//! Builds the flat rows the download endpoints stream out, one struct
//! per CSV line. Actual file writing and HTTP streaming are the caller's
//! concern; this module only shapes the data.

use std::collections::HashMap;

use serde::Serialize;

use caliper_core::effectiveness::{analyze_series, LookaheadWindow, TriggerEffect};
use caliper_core::evaluation::EvaluationThresholds;
use caliper_core::metric::MetricRow;
use caliper_core::sample::{Side, TIMESTAMP_FORMAT};
use caliper_core::series::SampleSeries;
use caliper_core::types::DbId;

// ---------------------------------------------------------------------------
// Duration formatting
// ---------------------------------------------------------------------------

/// Format a duration as `HH:MM:SS`. Negative durations render as zero.
pub fn format_duration(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        total % 3600 / 60,
        total % 60
    )
}

// ---------------------------------------------------------------------------
// Per-sample rows
// ---------------------------------------------------------------------------

/// One tick of the per-sample export: the raw reading, the trigger
/// state, the attributed effect of each trigger, and enough batch
/// metadata to make the row self-describing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleExportRow {
    /// 1-based position within the batch.
    pub sequence: usize,
    pub timestamp: String,
    pub time_of_day: String,
    pub sensor_left: f64,
    pub sensor_right: f64,
    pub trigger_left: u8,
    pub trigger_right: u8,
    pub trigger_left_label: &'static str,
    pub trigger_right_label: &'static str,
    /// Empty when the look-ahead was undefined for this trigger.
    pub effective_change_left_mm: Option<f64>,
    pub effective_change_right_mm: Option<f64>,
    pub effective_change_left_pct: Option<f64>,
    pub effective_change_right_pct: Option<f64>,
    pub std_min: Option<f64>,
    pub std_max: Option<f64>,
    pub std_mid: Option<f64>,
    pub is_correcting: bool,
    pub batch_code: Option<String>,
    pub line: i32,
    pub mcs: Option<String>,
    pub recipe_id: Option<DbId>,
    pub recipe_name: Option<String>,
    pub shift: u8,
}

/// Build the per-sample export of one batch.
pub fn sample_export_rows(
    series: &SampleSeries,
    row: &MetricRow,
    window: &LookaheadWindow,
) -> Vec<SampleExportRow> {
    let mut left_effects: HashMap<usize, TriggerEffect> = HashMap::new();
    let mut right_effects: HashMap<usize, TriggerEffect> = HashMap::new();
    for effect in analyze_series(series, window) {
        match effect.side {
            Side::Left => left_effects.insert(effect.sample_index, effect),
            Side::Right => right_effects.insert(effect.sample_index, effect),
        };
    }

    series
        .samples()
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let left = left_effects.get(&index);
            let right = right_effects.get(&index);
            SampleExportRow {
                sequence: index + 1,
                timestamp: sample.taken_at.format(TIMESTAMP_FORMAT).to_string(),
                time_of_day: sample.taken_at.format("%H:%M:%S").to_string(),
                sensor_left: sample.sensor_left,
                sensor_right: sample.sensor_right,
                trigger_left: sample.action_left.code(),
                trigger_right: sample.action_right.code(),
                trigger_left_label: sample.action_left.label(),
                trigger_right_label: sample.action_right.label(),
                effective_change_left_mm: left.map(|e| e.change_mm),
                effective_change_right_mm: right.map(|e| e.change_mm),
                effective_change_left_pct: left.map(|e| e.change_pct),
                effective_change_right_pct: right.map(|e| e.change_pct),
                std_min: sample.std_min,
                std_max: sample.std_max,
                std_mid: sample.std_mid,
                is_correcting: sample.is_correcting,
                batch_code: row.batch_code().map(str::to_string),
                line: row.machine.line,
                mcs: row.mcs().map(str::to_string),
                recipe_id: row.recipe_id(),
                recipe_name: row.recipe_name().map(str::to_string),
                shift: row.shift.number(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-batch rows
// ---------------------------------------------------------------------------

/// One batch of the metrics export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchExportRow {
    pub batch_code: Option<String>,
    pub line: i32,
    pub recipe_name: Option<String>,
    pub mcs: Option<String>,
    pub t_avg_left: f64,
    pub t_avg_right: f64,
    pub t_avg: f64,
    pub t_mae_left: f64,
    pub t_mae_right: f64,
    pub t_mae: f64,
    pub t_ssd_left: f64,
    pub t_ssd_right: f64,
    pub t_ssd: f64,
    pub t_balance: f64,
    pub correction_uptime: f64,
    pub correction_rate: f64,
    /// `HH:MM:SS` from first to last sample timestamp.
    pub duration: String,
    pub started_at: String,
    pub shift: u8,
    pub quality: &'static str,
    pub insufficient_data: bool,
}

/// Build one batch's export row.
pub fn batch_export_row(row: &MetricRow, thresholds: &EvaluationThresholds) -> BatchExportRow {
    let m = &row.metric;
    BatchExportRow {
        batch_code: row.batch_code().map(str::to_string),
        line: row.machine.line,
        recipe_name: row.recipe_name().map(str::to_string),
        mcs: row.mcs().map(str::to_string),
        t_avg_left: m.t_avg_left,
        t_avg_right: m.t_avg_right,
        t_avg: m.t_avg,
        t_mae_left: m.t_mae_left,
        t_mae_right: m.t_mae_right,
        t_mae: m.t_mae,
        t_ssd_left: m.t_ssd_left,
        t_ssd_right: m.t_ssd_right,
        t_ssd: m.t_ssd,
        t_balance: m.t_balance,
        correction_uptime: m.correction_uptime,
        correction_rate: m.correction_rate,
        duration: format_duration(row.duration()),
        started_at: row.started_at.format("%H:%M:%S").to_string(),
        shift: row.shift.number(),
        quality: m.quality_status(thresholds).label(),
        insufficient_data: m.insufficient_data,
    }
}

/// Build the per-batch export of a whole result set.
pub fn batch_export_rows(
    rows: &[MetricRow],
    thresholds: &EvaluationThresholds,
) -> Vec<BatchExportRow> {
    rows.iter().map(|row| batch_export_row(row, thresholds)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

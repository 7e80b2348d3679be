//! Explicit query filters over batch metrics.
//!
//! A [`MetricQuery`] is an immutable value object handed into every
//! call — there is no ambient, session-style filter state. Filtering is
//! a plain pass over a `MetricRow` collection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use caliper_core::error::CoreError;
use caliper_core::evaluation::{EvaluationThresholds, QualityStatus};
use caliper_core::metric::MetricRow;
use caliper_core::types::DbId;

// ---------------------------------------------------------------------------
// Quality filter
// ---------------------------------------------------------------------------

/// Optional pass/fail narrowing of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFilter {
    Pass,
    Fail,
}

// ---------------------------------------------------------------------------
// MetricQuery
// ---------------------------------------------------------------------------

/// Filter set of one analytics request.
///
/// The date range is inclusive on both ends; `end` covers the whole day
/// (a batch started 23:59:59 on `end` still matches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub machine_id: Option<DbId>,
    /// Case-insensitive substring match on the recipe name.
    pub recipe_name: Option<String>,
    /// Exact match on the batch mcs code.
    pub mcs: Option<String>,
    pub quality: Option<QualityFilter>,
}

impl MetricQuery {
    /// Build a query over a date range. An inverted range is a request
    /// error and fatal, unlike anything found inside the data.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::Validation(format!(
                "query start ({start}) must not be after end ({end})"
            )));
        }
        Ok(Self {
            start,
            end,
            machine_id: None,
            recipe_name: None,
            mcs: None,
            quality: None,
        })
    }

    /// Number of calendar days the range spans, both ends inclusive.
    pub fn period_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether one row satisfies every filter.
    pub fn matches(&self, row: &MetricRow, thresholds: &EvaluationThresholds) -> bool {
        let date = row.started_at.date();
        if date < self.start || date > self.end {
            return false;
        }
        if let Some(machine_id) = self.machine_id {
            if row.machine.id != machine_id {
                return false;
            }
        }
        if let Some(needle) = &self.recipe_name {
            let matched = row
                .recipe_name()
                .map(|name| name.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
        if let Some(mcs) = &self.mcs {
            if row.mcs() != Some(mcs.as_str()) {
                return false;
            }
        }
        if let Some(quality) = self.quality {
            let status = row.metric.quality_status(thresholds);
            let wanted = match quality {
                QualityFilter::Pass => QualityStatus::Pass,
                QualityFilter::Fail => QualityStatus::Fail,
            };
            if status != wanted {
                return false;
            }
        }
        true
    }

    /// Filter a collection down to the matching rows.
    pub fn apply(&self, rows: &[MetricRow], thresholds: &EvaluationThresholds) -> Vec<MetricRow> {
        rows.iter()
            .filter(|row| self.matches(row, thresholds))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

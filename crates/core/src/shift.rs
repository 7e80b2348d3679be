//! Production shift buckets.
//!
//! The plant runs three fixed 8-hour shifts. A batch belongs to the
//! shift its first sample falls into.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One of the three fixed production shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    /// 06:00-14:00
    First,
    /// 14:00-22:00
    Second,
    /// 22:00-06:00 (wraps past midnight)
    Third,
}

impl Shift {
    /// Classify an hour of day (0-23) into its shift.
    pub fn from_hour(hour: u32) -> Self {
        if (6..14).contains(&hour) {
            Self::First
        } else if (14..22).contains(&hour) {
            Self::Second
        } else {
            Self::Third
        }
    }

    /// Classify a timestamp into its shift.
    pub fn from_timestamp(ts: Timestamp) -> Self {
        use chrono::Timelike;
        Self::from_hour(ts.hour())
    }

    /// Shift number as used in reports and exports (1-3).
    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    /// Wall-clock range label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::First => "06:00-14:00",
            Self::Second => "14:00-22:00",
            Self::Third => "22:00-06:00",
        }
    }
}

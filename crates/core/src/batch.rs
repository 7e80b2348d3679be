//! Batch identity context: machine, recipe and rubber-batch descriptors.
//!
//! These are plain value snapshots of the records the persistence layer
//! owns; the analytics engine only reads them.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// A calender line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: DbId,
    /// Line number as painted on the floor; reports render it zero-padded.
    pub line: i32,
}

impl Machine {
    /// Display label, e.g. `Line 03`.
    pub fn label(&self) -> String {
        format!("Line {:02}", self.line)
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// A thickness recipe: the standard band the sheet must land in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: DbId,
    pub name: String,
    pub std_min: f64,
    pub std_max: f64,
}

impl Recipe {
    /// Target thickness: the middle of the standard band.
    pub fn std_mid(&self) -> f64 {
        (self.std_min + self.std_max) / 2.0
    }

    /// Alias for [`Recipe::std_mid`], the name operators use.
    pub fn target_thickness(&self) -> f64 {
        self.std_mid()
    }

    /// Band width (std_max - std_min).
    pub fn tolerance(&self) -> f64 {
        self.std_max - self.std_min
    }

    /// Whether a measured thickness falls inside the standard band.
    pub fn is_within_standard(&self, thickness: f64) -> bool {
        thickness >= self.std_min && thickness <= self.std_max
    }
}

// ---------------------------------------------------------------------------
// Rubber batch
// ---------------------------------------------------------------------------

/// Identity of the rubber batch that went through the calender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    /// Plant batch code, e.g. `RB240501A`.
    pub code: String,
    /// Material/color-side classification code.
    pub mcs: Option<String>,
    pub color: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_label_is_zero_padded() {
        let machine = Machine { id: 1, line: 3 };
        assert_eq!(machine.label(), "Line 03");
    }

    #[test]
    fn recipe_mid_is_band_center() {
        let recipe = Recipe {
            id: 1,
            name: "AF1 GS".to_string(),
            std_min: 3.0,
            std_max: 3.1,
        };
        assert!((recipe.std_mid() - 3.05).abs() < 1e-12);
        assert!((recipe.tolerance() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn standard_band_is_boundary_inclusive() {
        let recipe = Recipe {
            id: 1,
            name: "AF1 GS".to_string(),
            std_min: 3.0,
            std_max: 3.1,
        };
        assert!(recipe.is_within_standard(3.0));
        assert!(recipe.is_within_standard(3.1));
        assert!(!recipe.is_within_standard(2.99));
        assert!(!recipe.is_within_standard(3.11));
    }
}

//! Optimization constraint selection.
//!
//! The engine steers exactly one dimension toward the goal at a time; the
//! other dimension is the secondary cost being minimized (or, for power
//! constraints, the contribution being maximized).

use serde::{Deserialize, Serialize};

use crate::table::Dimension;

/// Which measured quantity the engine holds at the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    /// Hold the iteration rate at the goal; minimize power.
    Performance,
    /// Hold power at the goal; maximize the iteration rate.
    Power,
}

impl Constraint {
    /// The table dimension steered toward the goal.
    #[inline]
    pub const fn xup_dimension(self) -> Dimension {
        match self {
            Constraint::Performance => Dimension::Speedup,
            Constraint::Power => Dimension::Cost,
        }
    }

    /// The table dimension treated as the secondary cost.
    #[inline]
    pub const fn cost_dimension(self) -> Dimension {
        match self {
            Constraint::Performance => Dimension::Cost,
            Constraint::Power => Dimension::Speedup,
        }
    }

    /// Fixed-width name used in telemetry rows.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Constraint::Performance => "PERFORMANCE",
            Constraint::Power => "POWER",
        }
    }
}

impl core::fmt::Display for Constraint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

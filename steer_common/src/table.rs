//! Discrete system-configuration table shared by host and engine.
//!
//! The host owns an immutable array of [`ControlState`] entries describing
//! the system configurations it can switch between; the engine borrows it
//! read-only for its lifetime. Each entry carries a performance multiplier
//! (`speedup`) and a secondary-dimension multiplier (`cost`), both relative
//! to a baseline configuration. Entries with `speedup < 1` are idle states:
//! the host realizes them by sleeping, and they must name a non-idle
//! `idle_partner_id` the planner can hybridize them with inside a single
//! iteration.
//!
//! Parsing the table from a file is the host's job; the types here carry
//! serde derives so any format works.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MIN_XUP;
use crate::real::{self, Real};

/// One system configuration the host can switch into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Positional id; the table is indexed by it.
    pub id: u32,
    /// Performance multiplier relative to the baseline (>= 0). Values below
    /// one mark idle states.
    pub speedup: Real,
    /// Secondary-dimension multiplier (power or energy) relative to the
    /// baseline.
    pub cost: Real,
    /// For idle states, the companion non-idle state used to build a hybrid
    /// iteration. Ignored for non-idle states.
    #[serde(default)]
    pub idle_partner_id: u32,
}

impl ControlState {
    /// Whether the host realizes this state by sleeping.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.speedup < real::ONE
    }
}

/// Which multiplier of the table is being steered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    /// Performance multiplier (`speedup` field).
    Speedup,
    /// Secondary multiplier (`cost` field).
    Cost,
}

/// Validation error for a state table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The table has no entries.
    #[error("state table is empty")]
    Empty,

    /// An entry's `id` does not match its position.
    #[error("state at position {index} has id {found}, expected {index}")]
    IdMismatch {
        /// Position in the table.
        index: usize,
        /// The id the entry carries.
        found: u32,
    },

    /// A multiplier is negative or not finite.
    #[error("state {id} has a negative or non-finite multiplier")]
    BadMultiplier {
        /// Offending state id.
        id: u32,
    },

    /// An idle state's partner index is outside the table.
    #[error("idle state {id} names partner {partner}, which is out of range")]
    PartnerOutOfRange {
        /// Offending idle state id.
        id: u32,
        /// The partner it names.
        partner: u32,
    },

    /// An idle state's partner is itself idle.
    #[error("idle state {id} names partner {partner}, which is itself idle")]
    PartnerNotRunnable {
        /// Offending idle state id.
        id: u32,
        /// The partner it names.
        partner: u32,
    },
}

/// Check the structural invariants the engine relies on.
///
/// Ids must be dense and positional, multipliers finite and non-negative,
/// and every idle state must name an in-range, non-idle partner.
pub fn validate(states: &[ControlState]) -> Result<(), TableError> {
    if states.is_empty() {
        return Err(TableError::Empty);
    }
    for (index, state) in states.iter().enumerate() {
        if state.id as usize != index {
            return Err(TableError::IdMismatch { index, found: state.id });
        }
        let ok = real::is_finite(state.speedup)
            && real::is_finite(state.cost)
            && state.speedup >= real::ZERO
            && state.cost >= real::ZERO;
        if !ok {
            return Err(TableError::BadMultiplier { id: state.id });
        }
        if state.is_idle() {
            let partner = state.idle_partner_id;
            match states.get(partner as usize) {
                None => {
                    return Err(TableError::PartnerOutOfRange { id: state.id, partner });
                }
                Some(p) if p.is_idle() => {
                    return Err(TableError::PartnerNotRunnable { id: state.id, partner });
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Read the given multiplier dimension of a state.
#[inline]
pub fn xup_of(state: &ControlState, dim: Dimension) -> Real {
    match dim {
        Dimension::Speedup => state.speedup,
        Dimension::Cost => state.cost,
    }
}

/// Achievable multiplier range in a dimension.
///
/// The lower bound is the table minimum floored by [`MIN_XUP`]: idle states
/// pull it below one so sub-baseline goals stay targetable, while the floor
/// keeps the controller away from a zero multiplier. The upper bound is the
/// table maximum, never below the lower bound. The controller clamps its
/// output into this range.
pub fn xup_bounds(states: &[ControlState], dim: Dimension) -> (Real, Real) {
    let floor = real::from_f64(MIN_XUP);
    let mut min: Option<Real> = None;
    let mut max = real::ZERO;
    for state in states {
        let v = xup_of(state, dim);
        min = Some(match min {
            Some(m) if m < v => m,
            _ => v,
        });
        if v > max {
            max = v;
        }
    }
    let min = min.unwrap_or(real::ZERO);
    let lo = if min > floor { min } else { floor };
    let hi = if max > lo { max } else { lo };
    (lo, hi)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, speedup: f64, cost: f64, partner: u32) -> ControlState {
        ControlState {
            id,
            speedup: real::from_f64(speedup),
            cost: real::from_f64(cost),
            idle_partner_id: partner,
        }
    }

    #[test]
    fn empty_table_rejected() {
        assert_eq!(validate(&[]), Err(TableError::Empty));
    }

    #[test]
    fn valid_table_accepted() {
        let table = [entry(0, 0.0, 0.1, 1), entry(1, 1.0, 1.0, 0), entry(2, 2.0, 2.0, 0)];
        assert_eq!(validate(&table), Ok(()));
    }

    #[test]
    fn out_of_order_ids_rejected() {
        let table = [entry(1, 1.0, 1.0, 0), entry(0, 2.0, 2.0, 0)];
        assert_eq!(validate(&table), Err(TableError::IdMismatch { index: 0, found: 1 }));
    }

    #[test]
    fn negative_multiplier_rejected() {
        let table = [entry(0, -1.0, 1.0, 0)];
        assert_eq!(validate(&table), Err(TableError::BadMultiplier { id: 0 }));
    }

    #[test]
    fn idle_partner_must_be_in_range() {
        let table = [entry(0, 0.5, 0.5, 7), entry(1, 1.0, 1.0, 0)];
        assert_eq!(
            validate(&table),
            Err(TableError::PartnerOutOfRange { id: 0, partner: 7 })
        );
    }

    #[test]
    fn idle_partner_must_not_be_idle() {
        let table = [entry(0, 0.5, 0.5, 1), entry(1, 0.9, 1.0, 0), entry(2, 1.0, 1.0, 0)];
        assert_eq!(
            validate(&table),
            Err(TableError::PartnerNotRunnable { id: 0, partner: 1 })
        );
    }

    #[test]
    fn idle_entries_pull_the_lower_bound_to_the_floor() {
        let table = [entry(0, 0.0, 0.1, 1), entry(1, 1.0, 1.0, 0), entry(2, 2.0, 2.0, 0)];
        let (lo, hi) = xup_bounds(&table, Dimension::Speedup);
        assert!((real::to_f64(lo) - MIN_XUP).abs() < 1e-6);
        assert_eq!(real::to_f64(hi), 2.0);
    }

    #[test]
    fn bounds_without_idle_states_start_at_the_table_minimum() {
        let table = [entry(0, 1.0, 1.0, 0), entry(1, 2.0, 2.0, 0)];
        let (lo, hi) = xup_bounds(&table, Dimension::Speedup);
        assert_eq!(real::to_f64(lo), 1.0);
        assert_eq!(real::to_f64(hi), 2.0);
    }

    #[test]
    fn bounds_floor_small_multipliers() {
        let table = [entry(0, 0.001, 0.001, 1), entry(1, 1.0, 1.0, 0)];
        let (lo, _) = xup_bounds(&table, Dimension::Cost);
        assert!((real::to_f64(lo) - MIN_XUP).abs() < 1e-6);
    }

    #[test]
    fn bounds_degenerate_table() {
        let table = [entry(0, 0.0, 0.0, 0)];
        // No partner check: a zero-speedup state is idle, but this test only
        // exercises the range math.
        let (lo, hi) = xup_bounds(&table, Dimension::Speedup);
        assert_eq!(lo, hi);
        assert!((real::to_f64(lo) - MIN_XUP).abs() < 1e-6);
    }

    #[test]
    fn single_unit_state_collapses_bounds() {
        let table = [entry(0, 1.0, 1.0, 0)];
        let (lo, hi) = xup_bounds(&table, Dimension::Speedup);
        assert_eq!(real::to_f64(lo), 1.0);
        assert_eq!(real::to_f64(hi), 1.0);
    }
}

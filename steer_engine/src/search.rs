//! Pair search over the configuration table.
//!
//! Quadratic enumeration of (upper, lower) candidates bracketing the target
//! multiplier, pricing each with the time-division planner and keeping the
//! best. Tables are small (tens of states), so the O(n²) sweep with a
//! constant-time planner per pair is not worth optimizing.

use steer_common::constraint::Constraint;
use steer_common::real::{self, Real};
use steer_common::table::{self, ControlState};

use crate::plan::{self, PairSpec, Plan};

/// The winning pair and its schedule.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    /// Index of the lower state.
    pub lower: usize,
    /// Index of the upper state.
    pub upper: usize,
    /// The planner's priced schedule for the pair.
    pub plan: Plan,
}

/// Find the cheapest admissible pair realizing `target_xup`.
///
/// A pair qualifies when the upper state can reach the target
/// (`upper_xup >= target`, `upper_xup >= 1`) and the lower state sits at or
/// below it (`lower_xup <= target`). With `allow_idle` unset, idle lower
/// states are excluded entirely.
///
/// Steering performance, the secondary cost is minimized; steering power,
/// the secondary dimension is the performance contribution and is maximized.
/// Ties keep the first candidate in enumeration order. Returns `None` when
/// no pair qualifies; the caller must leave the previous configuration
/// untouched for the period.
pub fn find_best_pair(
    states: &[ControlState],
    constraint: Constraint,
    target_xup: Real,
    period: u32,
    workload: Real,
    allow_idle: bool,
) -> Option<Candidate> {
    let xup_dim = constraint.xup_dimension();
    let cost_dim = constraint.cost_dimension();
    let minimize = matches!(constraint, Constraint::Performance);

    let mut best: Option<Candidate> = None;
    let mut best_cost = if minimize {
        real::from_f64(f64::MAX)
    } else {
        real::ZERO
    };

    for (upper, upper_state) in states.iter().enumerate() {
        let upper_xup = table::xup_of(upper_state, xup_dim);
        if upper_xup < target_xup || upper_xup < real::ONE {
            continue;
        }
        for (lower, lower_state) in states.iter().enumerate() {
            let lower_xup = table::xup_of(lower_state, xup_dim);
            if lower_xup > target_xup {
                continue;
            }
            if lower_state.is_idle() && !allow_idle {
                continue;
            }

            let partner = if lower_state.is_idle() {
                let p = &states[lower_state.idle_partner_id as usize];
                Some((table::xup_of(p, xup_dim), table::xup_of(p, cost_dim)))
            } else {
                None
            };
            let spec = PairSpec {
                lower_xup,
                lower_cost: table::xup_of(lower_state, cost_dim),
                upper_xup,
                upper_cost: table::xup_of(upper_state, cost_dim),
                partner,
            };
            let plan = plan::divide_period(&spec, target_xup, period, workload);

            let better = if minimize {
                plan.cost_estimate < best_cost
            } else {
                plan.cost_estimate > best_cost
            };
            if better {
                best_cost = plan.cost_estimate;
                best = Some(Candidate { lower, upper, plan });
            }
        }
    }
    best
}

// ─── Tests ──────────────────────────────────────────────────────────

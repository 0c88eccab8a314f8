//! Time-division planner.
//!
//! Given a candidate (lower, upper) configuration pair and a target
//! multiplier, split the control period between the two states so the
//! combined effective multiplier equals the target, and price the schedule
//! in the secondary dimension. Costs are time-weighted: a state running for
//! `iters` iterations at multiplier `xup` contributes `iters / xup` time
//! units at its cost multiplier.
//!
//! An idle lower state (one the host realizes by sleeping) cannot run whole
//! iterations on its own. Instead the first iteration of the period becomes
//! a hybrid of the idle state and its designated partner, and the planner
//! reports how many nanoseconds of that iteration the host must sleep.

use steer_common::consts::NS_PER_SEC;
use steer_common::real::{self, Real};

/// Multipliers of one candidate pair, in planner dimensions: `xup` is the
/// steered dimension, `cost` the secondary one.
#[derive(Debug, Clone, Copy)]
pub struct PairSpec {
    /// Steered-dimension multiplier of the lower state.
    pub lower_xup: Real,
    /// Secondary multiplier of the lower state.
    pub lower_cost: Real,
    /// Steered-dimension multiplier of the upper state.
    pub upper_xup: Real,
    /// Secondary multiplier of the upper state.
    pub upper_cost: Real,
    /// Partner multipliers `(xup, cost)` when the lower state is idle.
    pub partner: Option<(Real, Real)>,
}

/// A priced schedule for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    /// Iterations to run in the lower state at the start of the period.
    pub low_state_iters: u32,
    /// Nanoseconds the host sleeps during the first iteration; nonzero only
    /// when the lower state is idle, and then `low_state_iters == 1`.
    pub idle_ns: u64,
    /// Time-weighted secondary cost of the whole period.
    pub cost_estimate: Real,
    /// Time-weighted denominator matching `cost_estimate`.
    pub time_estimate: Real,
    /// Realized secondary-dimension multiplier, `cost / time`.
    pub cost_xup_estimate: Real,
}

/// Compute the period split realizing `target_xup` over a candidate pair.
///
/// `workload` is the per-iteration workload in the steered dimension; it
/// scales the hybrid iteration's sleep time into seconds.
pub fn divide_period(pair: &PairSpec, target_xup: Real, period: u32, workload: Real) -> Plan {
    let r_period = real::from_int(period as i64);
    match pair.partner {
        Some(partner) => divide_idle(pair, partner, target_xup, r_period, workload),
        None => divide_running(pair, target_xup, r_period, period),
    }
}

/// Both states run whole iterations: solve
/// `1/target = x/lower + (1-x)/upper` for the iteration fraction `x` spent
/// in the lower state, then truncate to a whole iteration count.
fn divide_running(pair: &PairSpec, target_xup: Real, r_period: Real, period: u32) -> Plan {
    let one = real::ONE;
    if pair.lower_xup == pair.upper_xup {
        return upper_only(pair, r_period);
    }

    let x = (one / target_xup - one / pair.upper_xup)
        / (one / pair.lower_xup - one / pair.upper_xup);
    let x = x.clamp(real::ZERO, one);
    let low = real::to_int(r_period * x).min(period as i64) as u32;

    let t_low = if low == 0 {
        real::ZERO
    } else {
        real::from_int(low as i64) / pair.lower_xup
    };
    let t_up = if low == period {
        real::ZERO
    } else {
        real::from_int((period - low) as i64) / pair.upper_xup
    };
    let cost = t_low * pair.lower_cost + t_up * pair.upper_cost;
    let time = t_low + t_up;
    Plan {
        low_state_iters: low,
        idle_ns: 0,
        cost_estimate: cost,
        time_estimate: time,
        cost_xup_estimate: cost / time,
    }
}

/// Idle lower: one hybrid iteration of the idle state and its partner,
/// then `period - 1` iterations in the upper state. The hybrid multiplier
/// solves `1/hybrid + (period-1)/upper = period/target`.
fn divide_idle(
    pair: &PairSpec,
    (partner_xup, partner_cost): (Real, Real),
    target_xup: Real,
    r_period: Real,
    workload: Real,
) -> Plan {
    let one = real::ONE;
    let hybrid = (target_xup * pair.upper_xup)
        / (r_period * (pair.upper_xup - target_xup) + target_xup);

    // A full iteration at partner speed already meets the target; idling
    // within the iteration cannot help.
    if hybrid >= partner_xup {
        return upper_only(pair, r_period);
    }

    // Share of the hybrid iteration's work done in the idle state. A pure
    // sleep does no work; otherwise solve 1/hybrid = x/lower + (1-x)/partner.
    let x = if pair.lower_xup <= real::ZERO {
        real::ZERO
    } else {
        let x = (one / hybrid - one / partner_xup)
            / (one / pair.lower_xup - one / partner_xup);
        x.clamp(real::ZERO, one)
    };

    let t_hybrid = one / hybrid;
    let t_partner = (one - x) / partner_xup;
    let t_lower = t_hybrid - t_partner;
    let t_upper = (r_period - one) / pair.upper_xup;

    let cost = t_lower * pair.lower_cost + t_partner * partner_cost + t_upper * pair.upper_cost;
    let time = t_hybrid + t_upper;
    Plan {
        low_state_iters: 1,
        idle_ns: idle_nanos(workload * t_lower),
        cost_estimate: cost,
        time_estimate: time,
        cost_xup_estimate: cost / time,
    }
}

/// Degenerate schedule: the whole period in the upper state.
fn upper_only(pair: &PairSpec, r_period: Real) -> Plan {
    let time = r_period / pair.upper_xup;
    Plan {
        low_state_iters: 0,
        idle_ns: 0,
        cost_estimate: time * pair.upper_cost,
        time_estimate: time,
        cost_xup_estimate: pair.upper_cost,
    }
}

/// Truncate a span in seconds to whole nanoseconds, never below zero.
fn idle_nanos(seconds: Real) -> u64 {
    let ns = real::to_f64(seconds) * NS_PER_SEC;
    if ns <= 0.0 { 0 } else { ns as u64 }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(lower: (f64, f64), upper: (f64, f64)) -> PairSpec {
        PairSpec {
            lower_xup: real::from_f64(lower.0),
            lower_cost: real::from_f64(lower.1),
            upper_xup: real::from_f64(upper.0),
            upper_cost: real::from_f64(upper.1),
            partner: None,
        }
    }

    fn idle_pair(lower: (f64, f64), upper: (f64, f64), partner: (f64, f64)) -> PairSpec {
        PairSpec {
            partner: Some((real::from_f64(partner.0), real::from_f64(partner.1))),
            ..pair(lower, upper)
        }
    }

    #[test]
    fn equal_xups_collapse_to_upper() {
        let p = divide_period(&pair((1.0, 1.0), (1.0, 1.0)), real::ONE, 10, real::ONE);
        assert_eq!(p.low_state_iters, 0);
        assert_eq!(p.idle_ns, 0);
        assert!((real::to_f64(p.cost_xup_estimate) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn splits_iterations_between_running_states() {
        // 1/1.5 = x/1 + (1-x)/2 gives x = 1/3; ten iterations truncate to 3.
        let p = divide_period(&pair((1.0, 1.0), (2.0, 2.0)), real::from_f64(1.5), 10, real::ONE);
        assert_eq!(p.low_state_iters, 3);
        assert_eq!(p.idle_ns, 0);
        // 3 iterations at (1, cost 1) and 7 at (2, cost 2): time 6.5, cost 10.
        assert!((real::to_f64(p.cost_estimate) - 10.0).abs() < 1e-6);
        assert!((real::to_f64(p.time_estimate) - 6.5).abs() < 1e-6);
    }

    #[test]
    fn target_at_upper_runs_upper_only() {
        let p = divide_period(&pair((1.0, 1.0), (2.0, 2.0)), real::from_f64(2.0), 10, real::ONE);
        assert_eq!(p.low_state_iters, 0);
        assert!((real::to_f64(p.cost_xup_estimate) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn target_at_lower_runs_lower_for_whole_period() {
        let p = divide_period(&pair((1.0, 1.0), (2.0, 2.0)), real::ONE, 10, real::ONE);
        assert_eq!(p.low_state_iters, 10);
        assert!((real::to_f64(p.cost_xup_estimate) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn truncation_rounds_the_lower_share_down() {
        // x = (1/1.3 - 1/2) / (1/1 - 1/2) = 0.538...; 4 iterations give 2.15.
        let p = divide_period(&pair((1.0, 1.0), (2.0, 2.0)), real::from_f64(1.3), 4, real::ONE);
        assert_eq!(p.low_state_iters, 2);
    }

    #[test]
    fn pure_sleep_hybrid_schedules_one_low_iteration() {
        // Target below one with a pure-sleep idle state: the first iteration
        // hybridizes sleep with the partner and the host must idle.
        let spec = idle_pair((0.0, 0.1), (1.0, 1.0), (1.0, 1.0));
        let p = divide_period(&spec, real::from_f64(0.5), 4, real::ONE);
        assert_eq!(p.low_state_iters, 1);
        assert!(p.idle_ns > 0);
        // hybrid = (0.5 * 1) / (4 * 0.5 + 0.5) = 0.2; the hybrid iteration
        // takes 5 time units, 1 running and 4 asleep.
        assert!((p.idle_ns as i64 - 4_000_000_000i64).abs() <= 2);
        assert!((real::to_f64(p.time_estimate) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn throttled_idle_state_occupies_more_of_the_hybrid() {
        let sleeping = divide_period(
            &idle_pair((0.0, 0.1), (1.0, 1.0), (1.0, 1.0)),
            real::from_f64(0.5),
            4,
            real::ONE,
        );
        let throttled = divide_period(
            &idle_pair((0.1, 0.2), (1.0, 1.0), (1.0, 1.0)),
            real::from_f64(0.5),
            4,
            real::ONE,
        );
        assert_eq!(throttled.low_state_iters, 1);
        assert!(throttled.idle_ns > 0);
        // The throttled state performs its work share slowly, so it holds
        // the low state longer than a pure sleep would.
        assert!(throttled.idle_ns > sleeping.idle_ns);
    }

    #[test]
    fn hybrid_at_partner_speed_falls_back_to_upper_only() {
        // period 1 and target equal to the partner speed: the hybrid would
        // have to run at full partner speed, so idling cannot help.
        let spec = idle_pair((0.0, 0.1), (1.0, 1.0), (1.0, 1.0));
        let p = divide_period(&spec, real::ONE, 1, real::ONE);
        assert_eq!(p.low_state_iters, 0);
        assert_eq!(p.idle_ns, 0);
        assert!((real::to_f64(p.cost_xup_estimate) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn idle_time_scales_with_workload() {
        let spec = idle_pair((0.0, 0.1), (1.0, 1.0), (1.0, 1.0));
        let short = divide_period(&spec, real::from_f64(0.5), 4, real::from_f64(0.001));
        let long = divide_period(&spec, real::from_f64(0.5), 4, real::from_f64(0.01));
        assert!(long.idle_ns > short.idle_ns);
        let ratio = long.idle_ns as f64 / short.idle_ns as f64;
        assert!((ratio - 10.0).abs() < 1e-3);
    }

    #[test]
    fn idle_cost_blends_sleep_and_partner() {
        // hybrid 0.2: 1 unit at partner (cost 1), 4 units asleep (cost 0.1),
        // 3 upper iterations at cost 1: cost = 1 + 0.4 + 3 = 4.4, time 8.
        let spec = idle_pair((0.0, 0.1), (1.0, 1.0), (1.0, 1.0));
        let p = divide_period(&spec, real::from_f64(0.5), 4, real::ONE);
        assert!((real::to_f64(p.cost_estimate) - 4.4).abs() < 1e-6);
        assert!((real::to_f64(p.cost_xup_estimate) - 0.55).abs() < 1e-6);
    }
}

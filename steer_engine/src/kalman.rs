//! Kalman workload estimator.
//!
//! A scalar filter tracking the base rate of the application under a unit
//! multiplier. The measurement model is `y = h · x_hat` where `y` is the
//! observed rate (iterations/second or watts) and `h` is the multiplier that
//! was in effect when `y` was measured; `x_hat` is therefore the rate the
//! application would achieve at multiplier one, and `1 / x_hat` is the
//! per-iteration workload (seconds or joules) the controller scales its
//! gains by.
//!
//! Two independent instances run per engine, one over measured performance
//! and one over measured power, so a time workload and an energy workload are
//! both current regardless of the active constraint.

use steer_common::consts::{KALMAN_P_INIT, KALMAN_Q, KALMAN_R, KALMAN_X_HAT_INIT};
use steer_common::real::{self, Real};

const Q: Real = real::from_f64(KALMAN_Q);
const R: Real = real::from_f64(KALMAN_R);
const P_INIT: Real = real::from_f64(KALMAN_P_INIT);
const X_HAT_INIT: Real = real::from_f64(KALMAN_X_HAT_INIT);

/// Internal state of one workload filter.
///
/// All scalars are exposed read-only through telemetry, so the fields are
/// public; the engine mutates them only through [`filter`].
#[derive(Debug, Clone, Copy)]
pub struct KalmanState {
    /// Posterior base-rate estimate.
    pub x_hat: Real,
    /// Prior base-rate estimate.
    pub x_hat_minus: Real,
    /// Posterior error covariance.
    pub p: Real,
    /// Prior error covariance.
    pub p_minus: Real,
    /// Measurement gain: the multiplier applied when the sample was taken.
    pub h: Real,
    /// Kalman gain.
    pub k: Real,
}

impl Default for KalmanState {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanState {
    /// A fresh filter at the initial constants.
    pub const fn new() -> Self {
        Self {
            x_hat: X_HAT_INIT,
            x_hat_minus: real::ZERO,
            p: P_INIT,
            p_minus: real::ZERO,
            h: real::ZERO,
            k: real::ZERO,
        }
    }

    /// Reset to the initial constants.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Run one predict/update cycle and return the workload estimate.
///
/// # Arguments
/// - `state`: Mutable filter state.
/// - `y`: Observed rate for the elapsed period.
/// - `u_prev`: Multiplier that was applied while `y` was measured.
///
/// # Returns
/// The per-iteration workload `1 / x_hat` under a unit multiplier.
pub fn filter(state: &mut KalmanState, y: Real, u_prev: Real) -> Real {
    state.x_hat_minus = state.x_hat;
    state.p_minus = state.p + Q;
    state.h = u_prev;
    state.k = (state.p_minus * state.h) / (state.h * state.p_minus * state.h + R);
    state.x_hat = state.x_hat_minus + state.k * (y - state.h * state.x_hat_minus);
    state.p = (real::ONE - state.k * state.h) * state.p_minus;
    real::ONE / state.x_hat
}

// ─── Tests ──────────────────────────────────────────────────────────

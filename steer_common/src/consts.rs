//! Tuning constants for the steer workspace.
//!
//! Single source of truth for estimator and controller tuning. Imported by
//! all crates; no duplication permitted. Values are plain `f64` and are
//! converted into [`crate::real::Real`] at the point of use, so they hold
//! under both scalar representations.

use static_assertions::const_assert;

/// Floor for the achievable multiplier range derived from a state table.
pub const MIN_XUP: f64 = 0.01;

/// Kalman process-noise variance.
pub const KALMAN_Q: f64 = 0.00001;

/// Kalman measurement-noise variance.
pub const KALMAN_R: f64 = 0.01;

/// Initial error covariance of a freshly created filter.
pub const KALMAN_P_INIT: f64 = 1.0;

/// Initial base-workload estimate of a freshly created filter.
pub const KALMAN_X_HAT_INIT: f64 = 0.2;

/// First controller pole.
pub const POLE_1: f64 = 0.4;

/// Second controller pole.
pub const POLE_2: f64 = 0.1;

/// Controller zero.
pub const ZERO_1: f64 = 0.05;

/// Controller robustness gain. Unity keeps the integrator root at one, so a
/// constant multiplier is held exactly once the tracking error reaches zero.
pub const GAIN_MU: f64 = 1.0;

/// Nanoseconds per second, for idle-time conversion.
pub const NS_PER_SEC: f64 = 1e9;

// The filter is numerically stable only for positive noise and covariance,
// and the controller gain blows up at Z1 == 1.
const_assert!(KALMAN_R > 0.0);
const_assert!(KALMAN_Q >= 0.0);
const_assert!(KALMAN_P_INIT > 0.0);
const_assert!(KALMAN_X_HAT_INIT > 0.0);
const_assert!(ZERO_1 != 1.0);
const_assert!(POLE_1 > -1.0 && POLE_1 < 1.0);
const_assert!(POLE_2 > -1.0 && POLE_2 < 1.0);
const_assert!(MIN_XUP > 0.0);

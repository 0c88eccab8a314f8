//! Xup controller.
//!
//! Fixed-form second-order controller producing the target multiplier (the
//! "xup": speedup when steering performance, powerup when steering power).
//! The poles and zero are fixed at compile time; the error gains scale with
//! the current workload estimate so one tuning covers all applications. With
//! unity robustness gain the closed loop keeps an integrator root, so a
//! constant multiplier is held exactly once the tracking error is zero.
//!
//! Outputs are clamped to the achievable range derived from the state table.

use steer_common::consts::{GAIN_MU, POLE_1, POLE_2, ZERO_1};
use steer_common::real::{self, Real};

/// One controller instance; the engine runs two, one per dimension.
#[derive(Debug, Clone, Copy)]
pub struct XupController {
    u: Real,
    uo: Real,
    uoo: Real,
    e: Real,
    eo: Real,
    umin: Real,
    umax: Real,
    // Pole-derived weights, fixed at construction.
    wa: Real,
    wb: Real,
    wc: Real,
    wd: Real,
    wf: Real,
}

impl XupController {
    /// Build a controller clamped to `[umin, umax]`.
    ///
    /// History starts at the unit multiplier (clamped into range), matching
    /// the baseline configuration the host is assumed to start in.
    pub fn new(umin: Real, umax: Real) -> Self {
        let p1 = real::from_f64(POLE_1);
        let p2 = real::from_f64(POLE_2);
        let z1 = real::from_f64(ZERO_1);
        let mu = real::from_f64(GAIN_MU);
        let one = real::ONE;

        let wa = -(-p1 * z1 - p2 * z1 + mu * p1 * p2 - mu * p2 + p2 - mu * p1 + p1 + mu);
        let wb = -(-mu * p1 * p2 * z1 + p1 * p2 * z1 + mu * p2 * z1 + mu * p1 * z1 - mu * z1
            - p1 * p2);
        let wc = (mu - mu * p1) * p2 + mu * p1 - mu;
        let wd = ((mu * p1 - mu) * p2 - mu * p1 + mu) * z1;
        let wf = one / (z1 - one);

        let u = one.clamp(umin, umax);
        Self {
            u,
            uo: u,
            uoo: u,
            e: real::ZERO,
            eo: real::ZERO,
            umin,
            umax,
            wa,
            wb,
            wc,
            wd,
            wf,
        }
    }

    /// Compute the next target multiplier.
    ///
    /// # Arguments
    /// - `current`: Measured rate over the last period.
    /// - `desired`: The goal.
    /// - `workload`: Current workload estimate (scales the error gains).
    pub fn step(&mut self, current: Real, desired: Real, workload: Real) -> Real {
        self.e = desired - current;
        let c = self.wc * workload;
        let d = self.wd * workload;
        let u = self.wf * (self.wa * self.uo + self.wb * self.uoo + c * self.e + d * self.eo);
        let u = u.clamp(self.umin, self.umax);
        self.uoo = self.uo;
        self.uo = u;
        self.u = u;
        self.eo = self.e;
        u
    }

    /// Warm-start from a multiplier realized in this controller's dimension.
    ///
    /// Used to cross-seed the inactive dimension each period: the history is
    /// rewritten as if this controller had produced the planned multiplier
    /// itself, so a later constraint switch continues from live state.
    pub fn seed(&mut self, xup: Real) {
        let xup = xup.clamp(self.umin, self.umax);
        self.uoo = self.uo;
        self.uo = xup;
        self.u = xup;
        self.e = real::ZERO;
        self.eo = real::ZERO;
    }

    /// Most recent output.
    #[inline]
    pub fn output(&self) -> Real {
        self.u
    }

    /// Most recent tracking error.
    #[inline]
    pub fn error(&self) -> Real {
        self.e
    }

    /// Achievable multiplier range.
    #[inline]
    pub fn bounds(&self) -> (Real, Real) {
        (self.umin, self.umax)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

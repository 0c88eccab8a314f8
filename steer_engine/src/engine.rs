//! Control orchestrator.
//!
//! Runs the full pipeline once per period (estimate workloads, compute the
//! target multiplier, search for the cheapest realizing pair), then
//! dispatches the planned configurations across the period's iterations
//! through the host's actuator. The host calls [`Engine::apply_control`]
//! once per iteration of its own main loop; the engine performs no I/O
//! besides telemetry and never makes time advance itself.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use steer_common::constraint::Constraint;
use steer_common::real::{self, Real};
use steer_common::table::{self, ControlState, Dimension, TableError};
use steer_common::toggles::Toggles;

use crate::kalman::{self, KalmanState};
use crate::search;
use crate::telemetry::{FilterSnapshot, Record, Telemetry};
use crate::xup::XupController;

/// One reconfiguration request handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyRequest {
    /// State to switch into.
    pub new_id: usize,
    /// State the host was last asked to run.
    pub prev_id: usize,
    /// Nanoseconds to sleep before or during the new iteration; nonzero only
    /// when an idle state is being realized.
    pub idle_ns: u64,
    /// First request since construction; the host should apply even if
    /// `new_id == prev_id`.
    pub is_first: bool,
}

/// Host-side actuation seam.
///
/// The engine treats the implementation as opaque: it must not block the
/// calling thread beyond the requested idle sleep, and its success is not
/// checked.
pub trait Actuator {
    /// Reconfigure the system to `request.new_id`.
    fn apply(&mut self, request: &ApplyRequest);

    /// Report the configuration the system is currently in, if known.
    /// Consulted once at engine construction.
    fn current(&mut self) -> Option<usize> {
        None
    }
}

/// Engine construction parameters.
///
/// Serializable so hosts can keep them alongside their own configuration;
/// the kill switches are deliberately not, they come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Which measured quantity to hold at the goal.
    pub constraint: Constraint,
    /// The goal, in the constraint's unit (iterations/second or watts).
    pub goal: f64,
    /// Host iterations per control period.
    pub period: u32,
    /// Telemetry ring-buffer depth; zero disables telemetry.
    #[serde(default)]
    pub log_depth: usize,
    /// Telemetry file; required when `log_depth > 0`.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// Kill-switch override; `None` snapshots the process environment.
    #[serde(skip)]
    pub toggles: Option<Toggles>,
}

impl Settings {
    /// Settings with telemetry disabled and environment-driven toggles.
    pub fn new(constraint: Constraint, goal: f64, period: u32) -> Self {
        Self {
            constraint,
            goal,
            period,
            log_depth: 0,
            log_path: None,
            toggles: None,
        }
    }
}

/// Construction error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Goal was zero, negative, or not finite.
    #[error("goal must be positive and finite, got {0}")]
    InvalidGoal(f64),

    /// Period was zero.
    #[error("period must be at least one iteration")]
    InvalidPeriod,

    /// The state table failed validation.
    #[error("invalid state table: {0}")]
    Table(#[from] TableError),

    /// Buffered telemetry was requested without a file.
    #[error("telemetry depth is nonzero but no log path was given")]
    MissingLogPath,

    /// The telemetry file could not be created.
    #[error("cannot create telemetry log: {0}")]
    Log(#[from] std::io::Error),
}

/// Planned schedule for the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSchedule {
    /// Lower state of the winning pair; `None` when no pair qualified.
    pub lower: Option<usize>,
    /// Upper state of the winning pair; `None` when no pair qualified.
    pub upper: Option<usize>,
    /// Iterations left to run in the lower state.
    pub low_state_iters: u32,
    /// Pending sleep for the hybrid iteration.
    pub idle_ns: u64,
}

/// The feedback-control engine.
///
/// Owns its mutable state exclusively; borrows the configuration table
/// read-only for its lifetime. All entry points run on the host's thread.
pub struct Engine<'t, A: Actuator> {
    constraint: Constraint,
    goal: Real,
    period: u32,
    states: &'t [ControlState],
    actuator: A,
    toggles: Toggles,

    perf_filter: KalmanState,
    energy_filter: KalmanState,
    speedup: XupController,
    powerup: XupController,
    time_workload: Real,
    energy_workload: Real,

    schedule: PeriodSchedule,
    cost_estimate: Real,
    cost_xup_estimate: Real,

    last_id: usize,
    is_first_apply: bool,
    current_action: u32,

    telemetry: Telemetry,
}

impl<'t, A: Actuator> Engine<'t, A> {
    /// Validate the settings and table and build an engine.
    pub fn new(
        settings: Settings,
        states: &'t [ControlState],
        mut actuator: A,
    ) -> Result<Self, EngineError> {
        if !settings.goal.is_finite() || settings.goal <= 0.0 {
            return Err(EngineError::InvalidGoal(settings.goal));
        }
        if settings.period == 0 {
            return Err(EngineError::InvalidPeriod);
        }
        table::validate(states)?;

        let telemetry = match (settings.log_depth, &settings.log_path) {
            (0, _) => Telemetry::disabled(),
            (_, None) => return Err(EngineError::MissingLogPath),
            (depth, Some(path)) => Telemetry::create(path, depth)?,
        };

        let toggles = settings.toggles.unwrap_or_else(Toggles::from_env);
        let (smin, smax) = table::xup_bounds(states, Dimension::Speedup);
        let (cmin, cmax) = table::xup_bounds(states, Dimension::Cost);

        let last_id = actuator
            .current()
            .filter(|id| *id < states.len())
            .unwrap_or(states.len() - 1);

        info!(
            constraint = %settings.constraint,
            goal = settings.goal,
            period = settings.period,
            num_states = states.len(),
            initial_id = last_id,
            "control engine initialized"
        );

        Ok(Self {
            constraint: settings.constraint,
            goal: real::from_f64(settings.goal),
            period: settings.period,
            states,
            actuator,
            toggles,
            perf_filter: KalmanState::new(),
            energy_filter: KalmanState::new(),
            speedup: XupController::new(smin, smax),
            powerup: XupController::new(cmin, cmax),
            time_workload: real::ZERO,
            energy_workload: real::ZERO,
            schedule: PeriodSchedule {
                lower: None,
                upper: None,
                low_state_iters: 0,
                idle_ns: 0,
            },
            cost_estimate: real::ZERO,
            cost_xup_estimate: real::ZERO,
            last_id,
            is_first_apply: true,
            current_action: 0,
            telemetry,
        })
    }

    /// Feed one iteration's measurements and dispatch the scheduled
    /// configuration.
    ///
    /// At period boundaries the full pipeline runs; on other iterations only
    /// the dispatch decision is re-evaluated. Never fails: pathological
    /// inputs yield a clamped multiplier and, when no pair qualifies, no
    /// dispatch for the period.
    pub fn apply_control(&mut self, tag: u64, perf: f64, pwr: f64) {
        if self.toggles.contains(Toggles::DISABLE_CONTROL) {
            return;
        }
        let perf = real::from_f64(perf);
        let pwr = real::from_f64(pwr);

        if self.current_action == 0 {
            self.plan_period(tag, perf, pwr);
        }
        self.dispatch();
        self.current_action = (self.current_action + 1) % self.period;
    }

    /// Switch the steered dimension and goal mid-run.
    ///
    /// The newly active controller is already warm: it has been cross-seeded
    /// with the realized multiplier of its dimension every period.
    pub fn set_constraint(&mut self, constraint: Constraint, goal: f64) -> Result<(), EngineError> {
        if !goal.is_finite() || goal <= 0.0 {
            return Err(EngineError::InvalidGoal(goal));
        }
        info!(from = %self.constraint, to = %constraint, goal, "constraint switched");
        self.constraint = constraint;
        self.goal = real::from_f64(goal);
        Ok(())
    }

    /// Run the period-boundary pipeline: filters, controller, pair search,
    /// cross-seed, telemetry.
    fn plan_period(&mut self, tag: u64, perf: Real, pwr: Real) {
        self.time_workload = kalman::filter(&mut self.perf_filter, perf, self.speedup.output());
        self.energy_workload = kalman::filter(&mut self.energy_filter, pwr, self.powerup.output());

        let (measured, workload) = match self.constraint {
            Constraint::Performance => (perf, self.time_workload),
            Constraint::Power => (pwr, self.energy_workload),
        };
        let target = match self.constraint {
            Constraint::Performance => self.speedup.step(measured, self.goal, workload),
            Constraint::Power => self.powerup.step(measured, self.goal, workload),
        };

        let allow_idle = !self.toggles.contains(Toggles::DISABLE_IDLE);
        match search::find_best_pair(
            self.states,
            self.constraint,
            target,
            self.period,
            workload,
            allow_idle,
        ) {
            Some(found) => {
                self.schedule = PeriodSchedule {
                    lower: Some(found.lower),
                    upper: Some(found.upper),
                    low_state_iters: found.plan.low_state_iters,
                    idle_ns: found.plan.idle_ns,
                };
                self.cost_estimate = found.plan.cost_estimate;
                self.cost_xup_estimate = found.plan.cost_xup_estimate;
                // Keep the inactive dimension's controller continuous with
                // what the schedule actually realizes, so a constraint
                // switch starts from live history.
                match self.constraint {
                    Constraint::Performance => self.powerup.seed(self.cost_xup_estimate),
                    Constraint::Power => self.speedup.seed(self.cost_xup_estimate),
                }
                debug!(
                    tag,
                    target = real::to_f64(target),
                    lower = found.lower,
                    upper = found.upper,
                    low_state_iters = found.plan.low_state_iters,
                    idle_ns = found.plan.idle_ns,
                    "period planned"
                );
            }
            None => {
                // No admissible pair: drop the ids so the dispatcher leaves
                // the current configuration alone, but keep the iteration
                // counts of the last good schedule.
                self.schedule.lower = None;
                self.schedule.upper = None;
                warn!(tag, target = real::to_f64(target), "no admissible state pair");
            }
        }

        self.telemetry.push(self.record(tag, perf, pwr));
    }

    /// Pick this iteration's configuration and invoke the actuator on a
    /// transition.
    fn dispatch(&mut self) {
        let choice = if self.schedule.low_state_iters > 0 {
            self.schedule.low_state_iters -= 1;
            self.schedule.lower
        } else {
            self.schedule.upper
        };

        let Some(new_id) = choice else { return };
        if new_id == self.last_id && !self.is_first_apply {
            return;
        }

        let request = ApplyRequest {
            new_id,
            prev_id: self.last_id,
            idle_ns: self.schedule.idle_ns,
            is_first: self.is_first_apply,
        };
        if !self.toggles.contains(Toggles::DISABLE_APPLY) {
            trace!(new_id, prev_id = request.prev_id, idle_ns = request.idle_ns, "apply");
            self.actuator.apply(&request);
        }
        self.is_first_apply = false;
        self.last_id = new_id;
        // Idle happens at most once per period.
        self.schedule.idle_ns = 0;
    }

    fn record(&self, tag: u64, perf: Real, pwr: Real) -> Record {
        Record {
            tag,
            constraint: self.constraint,
            perf: real::to_f64(perf),
            perf_filter: snapshot(&self.perf_filter),
            speedup: real::to_f64(self.speedup.output()),
            speedup_error: real::to_f64(self.speedup.error()),
            power: real::to_f64(pwr),
            cost_filter: snapshot(&self.energy_filter),
            powerup: real::to_f64(self.powerup.output()),
            powerup_error: real::to_f64(self.powerup.error()),
            time_workload: real::to_f64(self.time_workload),
            energy_workload: real::to_f64(self.energy_workload),
            lower_id: self.schedule.lower.map_or(-1, |id| id as i64),
            upper_id: self.schedule.upper.map_or(-1, |id| id as i64),
            low_state_iters: self.schedule.low_state_iters,
            idle_ns: self.schedule.idle_ns,
        }
    }

    // ─── Read-only accessors ────────────────────────────────────────

    /// Active constraint.
    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    /// Current goal.
    pub fn goal(&self) -> f64 {
        real::to_f64(self.goal)
    }

    /// The schedule planned at the last period boundary.
    pub fn schedule(&self) -> &PeriodSchedule {
        &self.schedule
    }

    /// Current `(time, energy)` workload estimates.
    pub fn workloads(&self) -> (f64, f64) {
        (real::to_f64(self.time_workload), real::to_f64(self.energy_workload))
    }

    /// Current `(speedup, powerup)` controller outputs.
    pub fn outputs(&self) -> (f64, f64) {
        (real::to_f64(self.speedup.output()), real::to_f64(self.powerup.output()))
    }

    /// Secondary cost of the last planned period and the multiplier it
    /// realizes in the secondary dimension.
    pub fn cost_estimates(&self) -> (f64, f64) {
        (real::to_f64(self.cost_estimate), real::to_f64(self.cost_xup_estimate))
    }

    /// State most recently requested from the actuator.
    pub fn last_id(&self) -> usize {
        self.last_id
    }
}

fn snapshot(filter: &KalmanState) -> FilterSnapshot {
    FilterSnapshot {
        x_hat_minus: real::to_f64(filter.x_hat_minus),
        x_hat: real::to_f64(filter.x_hat),
        p_minus: real::to_f64(filter.p_minus),
        p: real::to_f64(filter.p),
        h: real::to_f64(filter.h),
        k: real::to_f64(filter.k),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

//! # Steer Control Engine
//!
//! Feedback-control engine that steers an application's runtime
//! configuration to meet a performance or power goal at minimum secondary
//! cost. Once per period the engine estimates the application's intrinsic
//! workload from noisy rate samples, computes the multiplier needed to hit
//! the goal, and schedules a pair of discrete system configurations (with
//! optional intra-period idling) that realizes it; between boundaries it
//! only dispatches the planned configurations through the host's actuator.
//!
//! ## Pipeline
//!
//! 1. **[`kalman`]** - workload estimation from measured rate and power
//! 2. **[`xup`]** - pole-placement controller producing the target multiplier
//! 3. **[`search`]** / **[`plan`]** - cheapest configuration pair and its
//!    time division over the period
//! 4. **[`engine`]** - per-iteration orchestration and dispatch
//! 5. **[`telemetry`]** - batched ring-buffer log of every planning step
//!
//! The engine is single-threaded and synchronous: the host drives it from
//! its own loop via [`Engine::apply_control`], and all actuation happens
//! through the [`Actuator`] seam the host implements.

pub mod engine;
pub mod kalman;
pub mod plan;
pub mod search;
pub mod telemetry;
pub mod xup;

pub use engine::{Actuator, ApplyRequest, Engine, EngineError, PeriodSchedule, Settings};
pub use steer_common::constraint::Constraint;
pub use steer_common::table::ControlState;
pub use steer_common::toggles::Toggles;

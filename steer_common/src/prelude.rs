//! Prelude module for common re-exports.
//!
//! `use steer_common::prelude::*;` pulls in the types nearly every consumer
//! needs without listing individual paths.

// ─── Numeric kernel ─────────────────────────────────────────────────
pub use crate::real::Real;

// ─── State table ────────────────────────────────────────────────────
pub use crate::table::{ControlState, Dimension, TableError};

// ─── Constraint ─────────────────────────────────────────────────────
pub use crate::constraint::Constraint;

// ─── Kill switches ──────────────────────────────────────────────────
pub use crate::toggles::Toggles;

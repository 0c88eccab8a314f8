//! Runtime kill switches.
//!
//! Operators can disable parts of the control pipeline without rebuilding the
//! host. The switches come from the environment, read once at engine
//! construction and cached; tests inject a [`Toggles`] value directly and
//! never touch the process environment.

use bitflags::bitflags;

/// Environment variable disabling the whole control step.
pub const ENV_DISABLE_CONTROL: &str = "POET_DISABLE_CONTROL";

/// Environment variable suppressing the actuation callback.
pub const ENV_DISABLE_APPLY: &str = "POET_DISABLE_APPLY";

/// Environment variable excluding idle states from planning.
pub const ENV_DISABLE_IDLE: &str = "POET_DISABLE_IDLE";

bitflags! {
    /// Pipeline kill switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Toggles: u8 {
        /// Control steps return immediately; no state is touched.
        const DISABLE_CONTROL = 0b0001;
        /// Planning runs but the actuation callback is never invoked.
        const DISABLE_APPLY   = 0b0010;
        /// The pair search never selects an idle lower state.
        const DISABLE_IDLE    = 0b0100;
    }
}

impl Toggles {
    /// Snapshot the kill switches from the process environment.
    ///
    /// A variable counts as set when present with any value, including empty.
    pub fn from_env() -> Self {
        let mut toggles = Toggles::empty();
        if std::env::var_os(ENV_DISABLE_CONTROL).is_some() {
            toggles |= Toggles::DISABLE_CONTROL;
        }
        if std::env::var_os(ENV_DISABLE_APPLY).is_some() {
            toggles |= Toggles::DISABLE_APPLY;
        }
        if std::env::var_os(ENV_DISABLE_IDLE).is_some() {
            toggles |= Toggles::DISABLE_IDLE;
        }
        toggles
    }
}

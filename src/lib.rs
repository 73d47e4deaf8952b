//! # sundial
//!
//! Schedules day and night modes around local sunrise and sunset.
//!
//! - **Solar events**: `geo` computes sunrise/sunset with the NOAA
//!   approximation and plans the next events over a horizon of days.
//! - **Scheduling**: `scheduler` places one tagged `at` job per event and
//!   keeps two systemd user timers that start a fade ahead of the next
//!   sunrise and sunset.
//! - **Fades**: `transition` steps the screen from its live state to a
//!   mode's profile through the `desktop` gateway.
//! - **Commands**: `commands` wires configuration and the system together
//!   for each subcommand; `args` parses the command line.

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod config;
pub mod constants;
pub mod desktop;
pub mod error;
pub mod geo;
pub mod mode;
pub mod scheduler;
pub mod signals;
pub mod time_source;
pub mod transition;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

pub use error::{CalculationError, Error, Result};
pub use mode::Mode;

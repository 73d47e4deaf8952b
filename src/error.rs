//! Error taxonomy shared by the scheduling engine.
//!
//! Every fallible engine function returns [`Result`], so the kind of failure
//! (bad input, astronomical impossibility, missing OS facility, failed queue
//! or timer operation) survives each call boundary. The command layer wraps
//! these in `anyhow` for reporting.

use chrono::NaiveDate;

use crate::desktop::ApplyError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad coordinates, timezone name, or other input shape.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The sun does not rise or set for the requested day.
    #[error("solar calculation failed")]
    Calculation(#[from] CalculationError),

    /// A required binary or service is missing or inactive.
    #[error("missing dependency: {0}")]
    Dependency(String),

    /// A job queue or timer operation failed.
    #[error("{message}")]
    Scheduler {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The desktop collaborator refused a state change.
    #[error("desktop apply failed")]
    Apply(#[from] ApplyError),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::Scheduler {
            message: message.into(),
            source: None,
        }
    }

    pub fn scheduler_io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Scheduler {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Why sunrise/sunset could not be computed for a given day.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    /// The sun stays above the horizon all day.
    #[error("polar day at latitude {latitude} on {date}: the sun never sets")]
    PolarDay { latitude: f64, date: NaiveDate },

    /// The sun stays below the horizon all day.
    #[error("polar night at latitude {latitude} on {date}: the sun never rises")]
    PolarNight { latitude: f64, date: NaiveDate },

    /// The hour angle denominator vanishes (observer at a pole).
    #[error("degenerate solar geometry at latitude {latitude} on {date}")]
    DegenerateGeometry { latitude: f64, date: NaiveDate },
}

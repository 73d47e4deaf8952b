//! Narrow interfaces to the desktop: reading and setting the screen's colour
//! temperature and brightness, and applying a whole mode at event time.
//!
//! The engine only talks to these traits. [`xsct::XsctGateway`] is the
//! concrete screen adapter; themes and backgrounds stay outside this crate.

pub mod xsct;

use crate::constants::{MAXIMUM_BRIGHTNESS, MAXIMUM_TEMP, MINIMUM_BRIGHTNESS, MINIMUM_TEMP};
use crate::mode::Mode;

/// Why the desktop refused a change.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {summary}")]
    CommandFailed { program: String, summary: String },

    #[error("{0}")]
    Rejected(String),
}

/// Target values for one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenProfile {
    pub temperature_k: u32,
    pub brightness: f64,
}

impl ScreenProfile {
    /// Clamp into hardware-safe bounds, with brightness further limited to
    /// the configured `[min_brightness, max_brightness]`.
    pub fn clamped(temperature_k: f64, brightness: f64, brightness_range: (f64, f64)) -> Self {
        let (low, high) = brightness_range;
        let low = low.max(MINIMUM_BRIGHTNESS);
        let high = high.min(MAXIMUM_BRIGHTNESS).max(low);
        Self {
            temperature_k: temperature_k
                .round()
                .clamp(f64::from(MINIMUM_TEMP), f64::from(MAXIMUM_TEMP))
                as u32,
            brightness: brightness.clamp(low, high),
        }
    }
}

/// Live screen values; either may be unset when the adjuster is off.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenReading {
    pub temperature_k: Option<u32>,
    pub brightness: Option<f64>,
}

#[cfg_attr(test, mockall::automock)]
pub trait DesktopStateGateway {
    fn get_state(&self) -> Result<ScreenReading, ApplyError>;

    fn apply_state(&self, temperature_k: u32, brightness: f64) -> Result<(), ApplyError>;
}

/// Applies a whole mode when a queued job fires.
pub trait ModeApplier {
    fn apply_mode(&self, mode: Mode) -> Result<(), ApplyError>;
}

/// Applies the configured screen profile for the requested mode.
pub struct ScreenProfileApplier<'a> {
    gateway: &'a dyn DesktopStateGateway,
    day: ScreenProfile,
    night: ScreenProfile,
    brightness_range: (f64, f64),
}

impl<'a> ScreenProfileApplier<'a> {
    pub fn new(
        gateway: &'a dyn DesktopStateGateway,
        day: ScreenProfile,
        night: ScreenProfile,
        brightness_range: (f64, f64),
    ) -> Self {
        Self {
            gateway,
            day,
            night,
            brightness_range,
        }
    }

    pub fn profile(&self, mode: Mode) -> ScreenProfile {
        match mode {
            Mode::Day => self.day,
            Mode::Night => self.night,
        }
    }
}

impl ModeApplier for ScreenProfileApplier<'_> {
    fn apply_mode(&self, mode: Mode) -> Result<(), ApplyError> {
        let configured = self.profile(mode);
        let profile = ScreenProfile::clamped(
            f64::from(configured.temperature_k),
            configured.brightness,
            self.brightness_range,
        );
        self.gateway
            .apply_state(profile.temperature_k, profile.brightness)?;
        log_decorated!(
            "Applied {mode} mode: {}K, brightness {:.2}",
            profile.temperature_k,
            profile.brightness
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_clamped_limits() {
        let profile = ScreenProfile::clamped(500.0, 5.0, (0.2, 1.5));
        assert_eq!(profile.temperature_k, MINIMUM_TEMP);
        assert_eq!(profile.brightness, 1.5);

        let profile = ScreenProfile::clamped(12000.0, 0.0, (0.2, 1.5));
        assert_eq!(profile.temperature_k, MAXIMUM_TEMP);
        assert_eq!(profile.brightness, 0.2);

        let profile = ScreenProfile::clamped(4499.6, 0.85, (0.1, 2.0));
        assert_eq!(profile.temperature_k, 4500);
        assert_eq!(profile.brightness, 0.85);
    }

    #[test]
    fn test_profile_applier_uses_mode_profile() {
        let mut gateway = MockDesktopStateGateway::new();
        gateway
            .expect_apply_state()
            .with(eq(4500), eq(0.85))
            .times(1)
            .returning(|_, _| Ok(()));

        let applier = ScreenProfileApplier::new(
            &gateway,
            ScreenProfile {
                temperature_k: 6500,
                brightness: 1.0,
            },
            ScreenProfile {
                temperature_k: 4500,
                brightness: 0.85,
            },
            (0.1, 2.0),
        );

        applier.apply_mode(Mode::Night).unwrap();
    }

    #[test]
    fn test_profile_applier_clamps_out_of_range_profile() {
        let mut gateway = MockDesktopStateGateway::new();
        gateway
            .expect_apply_state()
            .with(eq(MAXIMUM_TEMP), eq(1.2))
            .times(1)
            .returning(|_, _| Ok(()));

        let profile = ScreenProfile {
            temperature_k: 12000,
            brightness: 1.9,
        };
        let applier = ScreenProfileApplier::new(&gateway, profile, profile, (0.5, 1.2));

        applier.apply_mode(Mode::Day).unwrap();
    }

    #[test]
    fn test_profile_applier_propagates_failure() {
        let mut gateway = MockDesktopStateGateway::new();
        gateway
            .expect_apply_state()
            .returning(|_, _| Err(ApplyError::Rejected("no display".into())));

        let profile = ScreenProfile {
            temperature_k: 6500,
            brightness: 1.0,
        };
        let applier = ScreenProfileApplier::new(&gateway, profile, profile, (0.1, 2.0));

        assert!(matches!(
            applier.apply_mode(Mode::Day),
            Err(ApplyError::Rejected(_))
        ));
    }
}

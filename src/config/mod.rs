//! Configuration for sundial, loaded once per process.
//!
//! The file lives at `$XDG_CONFIG_HOME/sundial/sundial.toml` unless
//! `--config <path>` points elsewhere. It is parsed into [`RawConfig`], where
//! every field is optional, and then validated into [`Config`], where every
//! value is present, typed and within range.
//!
//! ```toml
//! [location]
//! latitude = "43.65N"          # Float or hemisphere notation
//! longitude = -79.38
//! timezone = "America/Toronto" # Optional, derived from coordinates if omitted
//!
//! [schedule]
//! horizon_days = 2             # Days of sunrise/sunset events to queue (1-31)
//!
//! [transition]
//! enabled = true               # Install fade timers ahead of each event
//! fade_duration_minutes = 15   # Length of each fade (0-240 | 0 = no fade)
//! fade_offset_minutes = 0      # Shift the fade end relative to the event
//! step_interval_seconds = 2    # Time between fade steps (1-600)
//!
//! [day]
//! temperature = 6500
//! brightness = 1.0
//!
//! [night]
//! temperature = 4500
//! brightness = 0.85
//!
//! [screen]
//! min_brightness = 0.1
//! max_brightness = 2.0
//! ```

pub mod builder;
pub mod loading;
pub mod validation;

use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;

use crate::desktop::ScreenProfile;
use crate::geo::GeoLocation;
use crate::mode::Mode;

pub use builder::create_default_config;
pub use loading::{default_config_path, load, load_from_path};

/// A coordinate as written in the file: a plain number or `"43.65N"`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CoordinateValue {
    Degrees(f64),
    Notation(String),
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawLocation {
    pub latitude: Option<CoordinateValue>,
    pub longitude: Option<CoordinateValue>,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawSchedule {
    pub horizon_days: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawTransition {
    pub enabled: Option<bool>,
    pub fade_duration_minutes: Option<u32>,
    pub fade_offset_minutes: Option<i32>,
    pub step_interval_seconds: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawProfile {
    pub temperature: Option<u32>,
    pub brightness: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawScreen {
    pub min_brightness: Option<f64>,
    pub max_brightness: Option<f64>,
}

/// The file as written. Missing sections and keys take their defaults
/// during validation.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawConfig {
    #[serde(default)]
    pub location: RawLocation,
    #[serde(default)]
    pub schedule: RawSchedule,
    #[serde(default)]
    pub transition: RawTransition,
    #[serde(default)]
    pub day: RawProfile,
    #[serde(default)]
    pub night: RawProfile,
    #[serde(default)]
    pub screen: RawScreen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSettings {
    pub enabled: bool,
    pub fade_duration: Duration,
    pub fade_offset_minutes: i32,
    pub step_interval: Duration,
}

impl TransitionSettings {
    /// Whether fade timers should be installed at all.
    pub fn fades_active(&self) -> bool {
        self.enabled && !self.fade_duration.is_zero()
    }
}

/// Validated settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub location: GeoLocation,
    pub timezone: Tz,
    pub horizon_days: u32,
    pub transition: TransitionSettings,
    pub day: ScreenProfile,
    pub night: ScreenProfile,
    pub brightness_range: (f64, f64),
}

impl Config {
    pub fn profile(&self, mode: Mode) -> ScreenProfile {
        match mode {
            Mode::Day => self.day,
            Mode::Night => self.night,
        }
    }

    /// Print the active settings as a log block.
    pub fn log_summary(&self) {
        log_block_start!("Loaded configuration");
        log_indented!(
            "Location: {:.4}°, {:.4}° ({})",
            self.location.latitude(),
            self.location.longitude(),
            self.timezone
        );
        log_indented!("Horizon: {} day(s)", self.horizon_days);
        if self.transition.fades_active() {
            log_indented!(
                "Fades: {} min, offset {} min, step {}s",
                self.transition.fade_duration.as_secs() / 60,
                self.transition.fade_offset_minutes,
                self.transition.step_interval.as_secs()
            );
        } else {
            log_indented!("Fades: disabled");
        }
        log_indented!(
            "Day: {}K/{:.2}, Night: {}K/{:.2}",
            self.day.temperature_k,
            self.day.brightness,
            self.night.temperature_k,
            self.night.brightness
        );
    }
}

//! Geographic inputs and solar event types.
//!
//! - [`solar`] computes sunrise, solar noon and sunset for one day.
//! - [`planner`] expands that over a horizon of days into future events.
//! - [`coordinates`] parses `43.65N` style notation.
//! - [`timezone`] resolves which IANA zone the events are expressed in.

pub mod coordinates;
pub mod planner;
pub mod solar;
pub mod timezone;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::constants::{MAXIMUM_LATITUDE, MAXIMUM_LONGITUDE, MINIMUM_LATITUDE, MINIMUM_LONGITUDE};
use crate::error::{Error, Result};
use crate::mode::Mode;

/// A validated observer position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    latitude: f64,
    longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&latitude) {
            return Err(Error::validation(format!(
                "latitude must be between {MINIMUM_LATITUDE} and {MAXIMUM_LATITUDE} degrees (got {latitude})"
            )));
        }
        if !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&longitude) {
            return Err(Error::validation(format!(
                "longitude must be between {MINIMUM_LONGITUDE} and {MAXIMUM_LONGITUDE} degrees (got {longitude})"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolarEventKind {
    Sunrise,
    Sunset,
}

impl SolarEventKind {
    /// The mode that begins at this event.
    pub fn mode(&self) -> Mode {
        match self {
            SolarEventKind::Sunrise => Mode::Day,
            SolarEventKind::Sunset => Mode::Night,
        }
    }
}

/// A sunrise or sunset, always carrying its timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarEvent {
    pub instant: DateTime<Tz>,
    pub kind: SolarEventKind,
}

impl SolarEvent {
    pub fn mode(&self) -> Mode {
        self.kind.mode()
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.instant.with_timezone(&Utc)
    }
}

/// Which mode should be active at `now`: day between today's sunrise and
/// sunset, night otherwise. Falls back to night when the sun does not rise
/// or set today.
pub fn current_mode(location: &GeoLocation, tz: Tz, now: DateTime<Utc>) -> Mode {
    let local_date = now.with_timezone(&tz).date_naive();
    match solar::compute_in(location, local_date, tz) {
        Ok(times)
            if times.sunrise.with_timezone(&Utc) <= now
                && now < times.sunset.with_timezone(&Utc) =>
        {
            Mode::Day
        }
        Ok(_) => Mode::Night,
        Err(e) => {
            log_warning!("Could not determine today's sun times ({e}), assuming night");
            Mode::Night
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn toronto() -> GeoLocation {
        GeoLocation::new(43.65, -79.38).unwrap()
    }

    #[test]
    fn test_location_rejects_out_of_range() {
        assert!(matches!(
            GeoLocation::new(91.0, 0.0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            GeoLocation::new(0.0, -180.5),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            GeoLocation::new(f64::NAN, 0.0),
            Err(Error::Validation(_))
        ));
        assert!(GeoLocation::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_current_mode_follows_sun() {
        let tz: Tz = "America/Toronto".parse().unwrap();
        let noon = tz.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        let midnight = tz.with_ymd_and_hms(2024, 6, 21, 0, 30, 0).unwrap();
        let late = tz.with_ymd_and_hms(2024, 6, 21, 22, 0, 0).unwrap();

        assert_eq!(current_mode(&toronto(), tz, noon.with_timezone(&Utc)), Mode::Day);
        assert_eq!(current_mode(&toronto(), tz, midnight.with_timezone(&Utc)), Mode::Night);
        assert_eq!(current_mode(&toronto(), tz, late.with_timezone(&Utc)), Mode::Night);
    }

    #[test]
    fn test_current_mode_polar_falls_back_to_night() {
        let tz: Tz = "Arctic/Longyearbyen".parse().unwrap();
        let location = GeoLocation::new(78.0, 15.0).unwrap();
        let noon = tz.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();

        assert_eq!(current_mode(&location, tz, noon.with_timezone(&Utc)), Mode::Night);
    }
}

//! Sunrise and sunset from the NOAA approximation.
//!
//! The fractional year drives a truncated Fourier series for the equation of
//! time and the solar declination. The hour angle at a zenith of 90.833°
//! (refraction plus the sun's apparent radius) then gives sunrise and sunset
//! symmetrically around solar noon, all in minutes after UTC midnight.
//!
//! When the hour angle's cosine falls outside [-1, 1] the sun never crosses
//! the horizon that day. That is reported as a [`CalculationError`] rather
//! than clamped into a plausible-looking but wrong time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::f64::consts::PI;

use super::GeoLocation;
use crate::constants::SUNRISE_ZENITH_DEG;
use crate::error::{CalculationError, Error, Result};

/// Below this the hour-angle denominator is treated as zero.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// One day's solar events, expressed in the requested timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: DateTime<Tz>,
    pub solar_noon: DateTime<Tz>,
    pub sunset: DateTime<Tz>,
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::validation(format!("unknown timezone '{name}'")))
}

/// Compute sunrise and sunset for raw coordinates and a timezone name.
///
/// Out-of-range coordinates and unknown timezones are validation errors; a
/// day without sunrise or sunset is a calculation error.
pub fn compute(latitude: f64, longitude: f64, date: NaiveDate, tz_name: &str) -> Result<SunTimes> {
    let location = GeoLocation::new(latitude, longitude)?;
    let tz = parse_timezone(tz_name)?;
    compute_in(&location, date, tz)
}

/// Same as [`compute`] for already validated inputs.
///
/// The formula works in UTC days. Where the zone's offset is far from
/// `longitude / 15` (Samoa, Tonga, the Line Islands) the UTC day's noon can
/// fall on a neighbouring local date, so the UTC day is shifted until solar
/// noon lands on `date` locally.
pub fn compute_in(location: &GeoLocation, date: NaiveDate, tz: Tz) -> Result<SunTimes> {
    let times = compute_utc_day(location, date, tz)?;
    let drift = (times.solar_noon.date_naive() - date).num_days();
    if drift == 0 {
        return Ok(times);
    }
    compute_utc_day(location, date - Duration::days(drift), tz)
}

fn compute_utc_day(location: &GeoLocation, date: NaiveDate, tz: Tz) -> Result<SunTimes> {
    let minutes = utc_event_minutes(location, date)?;
    let midnight = date.and_time(NaiveTime::MIN).and_utc();

    Ok(SunTimes {
        sunrise: at_minutes(midnight, minutes.sunrise).with_timezone(&tz),
        solar_noon: at_minutes(midnight, minutes.noon).with_timezone(&tz),
        sunset: at_minutes(midnight, minutes.sunset).with_timezone(&tz),
    })
}

/// Minutes after UTC midnight of the given date. May be negative or exceed
/// a day when the location is far from the Greenwich meridian.
#[derive(Debug, Clone, Copy)]
struct EventMinutes {
    sunrise: f64,
    noon: f64,
    sunset: f64,
}

fn utc_event_minutes(location: &GeoLocation, date: NaiveDate) -> Result<EventMinutes> {
    let latitude = location.latitude();
    let longitude = location.longitude();

    let day_of_year = f64::from(date.ordinal());
    let gamma = 2.0 * PI / 365.0 * (day_of_year - 1.0 + (12.0 - longitude / 15.0) / 24.0);

    let eqtime = 229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin());

    let declination = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin();

    let lat_rad = latitude.to_radians();
    let denominator = lat_rad.cos() * declination.cos();
    if denominator.abs() < DEGENERATE_EPSILON {
        return Err(CalculationError::DegenerateGeometry { latitude, date }.into());
    }

    let cos_hour_angle =
        (SUNRISE_ZENITH_DEG.to_radians().cos() - lat_rad.sin() * declination.sin()) / denominator;
    if cos_hour_angle > 1.0 {
        return Err(CalculationError::PolarNight { latitude, date }.into());
    }
    if cos_hour_angle < -1.0 {
        return Err(CalculationError::PolarDay { latitude, date }.into());
    }

    let hour_angle_minutes = 4.0 * cos_hour_angle.acos().to_degrees();
    let noon = 720.0 - 4.0 * longitude - eqtime;

    Ok(EventMinutes {
        sunrise: noon - hour_angle_minutes,
        noon,
        sunset: noon + hour_angle_minutes,
    })
}

fn at_minutes(midnight: DateTime<Utc>, minutes: f64) -> DateTime<Utc> {
    midnight + Duration::seconds((minutes * 60.0).round() as i64)
}

//! Turn a [`RawConfig`] into a [`Config`], rejecting out-of-range values.
//!
//! Every failure is a validation error naming the offending key.

use std::time::Duration;

use super::{Config, CoordinateValue, RawConfig, RawProfile, TransitionSettings};
use crate::constants::*;
use crate::desktop::ScreenProfile;
use crate::error::{Error, Result};
use crate::geo::GeoLocation;
use crate::geo::coordinates::{Axis, parse_coordinate};
use crate::geo::timezone::resolve_timezone;

pub fn validate_config(raw: &RawConfig) -> Result<Config> {
    let latitude = coordinate(
        raw.location.latitude.as_ref(),
        Axis::Latitude,
        DEFAULT_LATITUDE,
    )?;
    let longitude = coordinate(
        raw.location.longitude.as_ref(),
        Axis::Longitude,
        DEFAULT_LONGITUDE,
    )?;
    let location = GeoLocation::new(latitude, longitude)?;

    let timezone = match raw.location.timezone.as_deref() {
        Some(name) => resolve_timezone(Some(name), &location)
            .map_err(|_| Error::validation(format!("location.timezone '{name}' is not a known IANA zone")))?,
        None if raw.location.latitude.is_none() && raw.location.longitude.is_none() => {
            resolve_timezone(Some(DEFAULT_TIMEZONE), &location)?
        }
        None => resolve_timezone(None, &location)?,
    };

    let horizon_days = raw.schedule.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);
    if !(MINIMUM_HORIZON_DAYS..=MAXIMUM_HORIZON_DAYS).contains(&horizon_days) {
        return Err(Error::validation(format!(
            "schedule.horizon_days ({horizon_days}) must be between {MINIMUM_HORIZON_DAYS} and {MAXIMUM_HORIZON_DAYS}"
        )));
    }

    let transition = validate_transition(raw)?;

    let min_brightness = raw.screen.min_brightness.unwrap_or(MINIMUM_BRIGHTNESS);
    let max_brightness = raw.screen.max_brightness.unwrap_or(MAXIMUM_BRIGHTNESS);
    for (key, value) in [
        ("screen.min_brightness", min_brightness),
        ("screen.max_brightness", max_brightness),
    ] {
        if !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&value) {
            return Err(Error::validation(format!(
                "{key} ({value}) must be between {MINIMUM_BRIGHTNESS} and {MAXIMUM_BRIGHTNESS}"
            )));
        }
    }
    if min_brightness > max_brightness {
        return Err(Error::validation(format!(
            "screen.min_brightness ({min_brightness}) must not exceed screen.max_brightness ({max_brightness})"
        )));
    }
    let brightness_range = (min_brightness, max_brightness);

    let day = profile(
        "day",
        &raw.day,
        DEFAULT_DAY_TEMP,
        DEFAULT_DAY_BRIGHTNESS,
        brightness_range,
    )?;
    let night = profile(
        "night",
        &raw.night,
        DEFAULT_NIGHT_TEMP,
        DEFAULT_NIGHT_BRIGHTNESS,
        brightness_range,
    )?;

    Ok(Config {
        location,
        timezone,
        horizon_days,
        transition,
        day,
        night,
        brightness_range,
    })
}

fn coordinate(value: Option<&CoordinateValue>, axis: Axis, default: f64) -> Result<f64> {
    match value {
        None => Ok(default),
        Some(CoordinateValue::Degrees(degrees)) => Ok(*degrees),
        Some(CoordinateValue::Notation(text)) => parse_coordinate(text, axis),
    }
}

fn validate_transition(raw: &RawConfig) -> Result<TransitionSettings> {
    let settings = &raw.transition;

    let fade_minutes = settings
        .fade_duration_minutes
        .unwrap_or(DEFAULT_FADE_DURATION_MINUTES);
    if fade_minutes > MAXIMUM_FADE_DURATION_MINUTES {
        return Err(Error::validation(format!(
            "transition.fade_duration_minutes ({fade_minutes}) must be between 0 and {MAXIMUM_FADE_DURATION_MINUTES}"
        )));
    }

    let offset = settings
        .fade_offset_minutes
        .unwrap_or(DEFAULT_FADE_OFFSET_MINUTES);
    if !(-MAXIMUM_FADE_OFFSET_MINUTES..=MAXIMUM_FADE_OFFSET_MINUTES).contains(&offset) {
        return Err(Error::validation(format!(
            "transition.fade_offset_minutes ({offset}) must be between -{MAXIMUM_FADE_OFFSET_MINUTES} and {MAXIMUM_FADE_OFFSET_MINUTES}"
        )));
    }

    let step_seconds = settings
        .step_interval_seconds
        .unwrap_or(DEFAULT_STEP_INTERVAL_SECONDS);
    if !(MINIMUM_STEP_INTERVAL_SECONDS..=MAXIMUM_STEP_INTERVAL_SECONDS).contains(&step_seconds) {
        return Err(Error::validation(format!(
            "transition.step_interval_seconds ({step_seconds}) must be between {MINIMUM_STEP_INTERVAL_SECONDS} and {MAXIMUM_STEP_INTERVAL_SECONDS}"
        )));
    }

    Ok(TransitionSettings {
        enabled: settings.enabled.unwrap_or(DEFAULT_TRANSITIONS_ENABLED),
        fade_duration: Duration::from_secs(u64::from(fade_minutes) * 60),
        fade_offset_minutes: offset,
        step_interval: Duration::from_secs(u64::from(step_seconds)),
    })
}

fn profile(
    section: &str,
    raw: &RawProfile,
    default_temp: u32,
    default_brightness: f64,
    (low, high): (f64, f64),
) -> Result<ScreenProfile> {
    let temperature_k = raw.temperature.unwrap_or(default_temp);
    if !(MINIMUM_TEMP..=MAXIMUM_TEMP).contains(&temperature_k) {
        return Err(Error::validation(format!(
            "{section}.temperature ({temperature_k}) must be between {MINIMUM_TEMP} and {MAXIMUM_TEMP} Kelvin"
        )));
    }

    let brightness = raw.brightness.unwrap_or(default_brightness);
    if !(low..=high).contains(&brightness) {
        return Err(Error::validation(format!(
            "{section}.brightness ({brightness}) must be between {low} and {high}"
        )));
    }

    Ok(ScreenProfile {
        temperature_k,
        brightness,
    })
}

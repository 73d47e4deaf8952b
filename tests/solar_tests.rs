use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use sundial::geo::planner::{EventWindowPlanner, plan};
use sundial::geo::solar::{compute, compute_in};
use sundial::geo::{GeoLocation, SolarEventKind};
use sundial::{CalculationError, Error};

fn assert_near(actual: NaiveTime, expected: &str, tolerance_minutes: i64) {
    let expected = NaiveTime::parse_from_str(expected, "%H:%M").unwrap();
    let delta = (actual - expected).num_seconds().abs();
    assert!(
        delta <= tolerance_minutes * 60,
        "{actual} is more than {tolerance_minutes} min from {expected}"
    );
}

#[test]
fn test_toronto_summer_solstice() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
    let times = compute(43.65, -79.38, date, "America/Toronto").unwrap();

    assert_near(times.sunrise.time(), "05:36", 2);
    assert_near(times.sunset.time(), "21:03", 2);
    assert_eq!(times.sunrise.date_naive(), date);
    assert_eq!(times.sunset.date_naive(), date);
}

#[test]
fn test_svalbard_midnight_sun_and_polar_night() {
    let summer = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
    let winter = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();

    assert!(matches!(
        compute(78.0, 15.0, summer, "UTC"),
        Err(Error::Calculation(CalculationError::PolarDay { .. }))
    ));
    assert!(matches!(
        compute(78.0, 15.0, winter, "UTC"),
        Err(Error::Calculation(CalculationError::PolarNight { .. }))
    ));
}

#[test]
fn test_planner_skips_polar_days() {
    let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
    let events = plan(78.0, 15.0, "Arctic/Longyearbyen", 5, now).unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_planner_alternates_outside_polar_regions() {
    let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
    let events = plan(-33.87, 151.21, "Australia/Sydney", 4, now).unwrap();

    assert!(events.len() >= 6);
    for pair in events.windows(2) {
        assert_ne!(pair[0].kind, pair[1].kind);
        assert!(pair[0].utc() < pair[1].utc());
    }
}

/// Zones paired with a longitude inside them, including offsets far from
/// `longitude / 15`.
const ZONES: &[(&str, f64)] = &[
    ("UTC", 0.0),
    ("America/Toronto", -79.38),
    ("America/Anchorage", -149.9),
    ("Europe/Madrid", -3.7),
    ("Asia/Kolkata", 77.2),
    ("Asia/Tokyo", 139.65),
    ("Pacific/Auckland", 174.76),
    ("Pacific/Honolulu", -157.86),
    ("Pacific/Apia", -171.76),
    ("Pacific/Tongatapu", -175.2),
    ("Pacific/Kiritimati", -157.4),
];

fn at(now_offset_minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(now_offset_minutes)
}

proptest! {
    #[test]
    fn prop_sunrise_noon_sunset_ordered(
        latitude in -50.0f64..=50.0,
        zone in 0usize..ZONES.len(),
        day in 0u32..366,
    ) {
        let (tz_name, longitude) = ZONES[zone];
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i64::from(day));
        let times = compute(latitude, longitude, date, tz_name).unwrap();

        prop_assert!(times.sunrise < times.solar_noon);
        prop_assert!(times.solar_noon < times.sunset);
        prop_assert_eq!(times.sunrise.date_naive(), date);
        prop_assert_eq!(times.sunset.date_naive(), date);
    }

    #[test]
    fn prop_compute_is_deterministic(
        latitude in -89.0f64..=89.0,
        longitude in -180.0f64..=180.0,
        day in 0u32..366,
    ) {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i64::from(day));
        let location = GeoLocation::new(latitude, longitude).unwrap();

        let first = compute_in(&location, date, Tz::UTC);
        let second = compute_in(&location, date, Tz::UTC);
        prop_assert_eq!(first.ok(), second.ok());
    }

    #[test]
    fn prop_planner_returns_future_events_in_order(
        latitude in -66.0f64..=66.0,
        longitude in -180.0f64..=180.0,
        offset in 0i64..(366 * 24 * 60),
        horizon in 1u32..=5,
    ) {
        let now = at(offset);
        let location = GeoLocation::new(latitude, longitude).unwrap();
        let planner = EventWindowPlanner::new(location, Tz::UTC, horizon).unwrap();
        let events = planner.plan(now);

        for event in &events {
            prop_assert!(event.utc() > now);
        }
        for pair in events.windows(2) {
            prop_assert!(pair[0].utc() < pair[1].utc());
        }
        prop_assert!(events.iter().all(|e| matches!(e.kind, SolarEventKind::Sunrise | SolarEventKind::Sunset)));
    }
}

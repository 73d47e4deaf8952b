//! Expands daily solar events over a horizon of days.
//!
//! A day whose sun never rises or sets is logged and skipped; the rest of the
//! horizon is still planned. Only events strictly after `now` survive.
//!
//! Two events landing on the same instant is not expected in practice. When
//! it happens the later-computed event replaces the earlier one and a warning
//! names both, so the collision is visible in the logs.

use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::solar::{self, parse_timezone};
use super::{GeoLocation, SolarEvent, SolarEventKind};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct EventWindowPlanner {
    location: GeoLocation,
    tz: Tz,
    horizon_days: u32,
}

impl EventWindowPlanner {
    pub fn new(location: GeoLocation, tz: Tz, horizon_days: u32) -> Result<Self> {
        if horizon_days == 0 {
            return Err(Error::validation("horizon_days must be at least 1"));
        }
        Ok(Self {
            location,
            tz,
            horizon_days,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Future events within the horizon, in chronological order.
    pub fn plan(&self, now: DateTime<Utc>) -> Vec<SolarEvent> {
        let first_day = now.with_timezone(&self.tz).date_naive();
        let mut candidates = Vec::with_capacity(self.horizon_days as usize * 2);

        for offset in 0..self.horizon_days {
            let Some(date) = first_day.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            match solar::compute_in(&self.location, date, self.tz) {
                Ok(times) => {
                    candidates.push(SolarEvent {
                        instant: times.sunrise,
                        kind: SolarEventKind::Sunrise,
                    });
                    candidates.push(SolarEvent {
                        instant: times.sunset,
                        kind: SolarEventKind::Sunset,
                    });
                }
                Err(Error::Calculation(reason)) => {
                    log_warning!("Skipping {date}: {reason}");
                }
                Err(e) => {
                    log_error!("Skipping {date}, solar computation rejected its inputs: {e}");
                }
            }
        }

        merge_events(candidates, now)
    }
}

/// Convenience wrapper over raw inputs.
pub fn plan(
    latitude: f64,
    longitude: f64,
    tz_name: &str,
    horizon_days: u32,
    now: DateTime<Utc>,
) -> Result<Vec<SolarEvent>> {
    let location = GeoLocation::new(latitude, longitude)?;
    let tz = parse_timezone(tz_name)?;
    Ok(EventWindowPlanner::new(location, tz, horizon_days)?.plan(now))
}

/// Drop events at or before `now`, deduplicate by instant and sort.
fn merge_events(
    candidates: impl IntoIterator<Item = SolarEvent>,
    now: DateTime<Utc>,
) -> Vec<SolarEvent> {
    let mut by_instant: BTreeMap<DateTime<Utc>, SolarEvent> = BTreeMap::new();

    for event in candidates {
        let key = event.utc();
        if key <= now {
            continue;
        }
        match by_instant.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(event);
            }
            Entry::Occupied(mut slot) => {
                log_warning!(
                    "{:?} and {:?} share the instant {}, keeping {:?}",
                    slot.get().kind,
                    event.kind,
                    key,
                    event.kind
                );
                slot.insert(event);
            }
        }
    }

    by_instant.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use chrono::{Duration, TimeZone};

    fn toronto_planner(horizon: u32) -> EventWindowPlanner {
        let location = GeoLocation::new(43.65, -79.38).unwrap();
        EventWindowPlanner::new(location, chrono_tz::America::Toronto, horizon).unwrap()
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let location = GeoLocation::new(43.65, -79.38).unwrap();
        assert!(matches!(
            EventWindowPlanner::new(location, Tz::UTC, 0),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_midday_plan_skips_todays_sunrise() {
        let now = chrono_tz::America::Toronto
            .with_ymd_and_hms(2024, 6, 21, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let events = toronto_planner(2).plan(now);

        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SolarEventKind::Sunset,
                SolarEventKind::Sunrise,
                SolarEventKind::Sunset
            ]
        );
        assert_eq!(events[0].mode(), Mode::Night);
        assert_eq!(events[1].mode(), Mode::Day);
        assert!(events.windows(2).all(|w| w[0].instant < w[1].instant));
    }

    #[test]
    fn test_polar_days_are_skipped_not_fatal() {
        // Mid-April at 70N: the last sunsets before the midnight sun.
        let location = GeoLocation::new(70.0, 25.0).unwrap();
        let planner = EventWindowPlanner::new(location, chrono_tz::Europe::Oslo, 60).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap();

        let events = planner.plan(now);

        assert!(!events.is_empty());
        assert!(events.len() < 120);
        assert!(events.iter().all(|e| e.utc() > now));
    }

    #[test]
    fn test_far_east_zone_keeps_todays_sunset() {
        let location = GeoLocation::new(-13.83, -171.76).unwrap();
        let planner = EventWindowPlanner::new(location, chrono_tz::Pacific::Apia, 1).unwrap();
        let now = chrono_tz::Pacific::Apia
            .with_ymd_and_hms(2024, 6, 21, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);

        let events = planner.plan(now);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SolarEventKind::Sunset);
        assert_eq!(
            events[0].instant.date_naive(),
            chrono::NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
        );
    }

    #[test]
    fn test_collision_keeps_later_entry() {
        let tz = chrono_tz::UTC;
        let instant = tz.with_ymd_and_hms(2030, 1, 1, 7, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        let merged = merge_events(
            vec![
                SolarEvent {
                    instant,
                    kind: SolarEventKind::Sunrise,
                },
                SolarEvent {
                    instant: instant + Duration::hours(10),
                    kind: SolarEventKind::Sunset,
                },
                SolarEvent {
                    instant,
                    kind: SolarEventKind::Sunset,
                },
            ],
            now,
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].kind, SolarEventKind::Sunset);
        assert_eq!(merged[0].instant, instant);
    }

    #[test]
    fn test_event_at_now_is_excluded() {
        let instant = chrono_tz::UTC.with_ymd_and_hms(2030, 1, 1, 7, 0, 0).unwrap();
        let merged = merge_events(
            vec![SolarEvent {
                instant,
                kind: SolarEventKind::Sunrise,
            }],
            instant.with_timezone(&Utc),
        );
        assert!(merged.is_empty());
    }

    #[test]
    fn test_raw_plan_validates() {
        let now = Utc::now();
        assert!(plan(43.65, -79.38, "Nowhere/Land", 2, now).is_err());
        assert!(plan(43.65, -200.0, "UTC", 2, now).is_err());
        assert!(plan(43.65, -79.38, "America/Toronto", 2, now).is_ok());
    }
}

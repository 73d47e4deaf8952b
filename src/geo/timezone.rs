//! Timezone resolution for solar events.
//!
//! Order: the configured name, then a boundary lookup on the coordinates,
//! then the system's own zone, and finally UTC.

use chrono_tz::Tz;
use std::path::Path;
use tzf_rs::DefaultFinder;

use super::GeoLocation;
use super::solar::parse_timezone;
use crate::error::Result;

/// Resolve the zone events are expressed in. A configured name that does not
/// parse is a validation error rather than a silent fallback.
pub fn resolve_timezone(configured: Option<&str>, location: &GeoLocation) -> Result<Tz> {
    if let Some(name) = configured {
        return parse_timezone(name);
    }

    if let Some(tz) = timezone_from_coordinates(location) {
        log_debug!("Timezone {} derived from coordinates", tz.name());
        return Ok(tz);
    }

    if let Some(tz) = detect_system_timezone() {
        log_debug!("Timezone {} taken from the system", tz.name());
        return Ok(tz);
    }

    log_warning!("Could not determine a timezone, using UTC");
    Ok(Tz::UTC)
}

/// Look up the zone whose boundary contains the coordinates. Building the
/// finder loads the boundary data, so this is meant to run once per process.
pub fn timezone_from_coordinates(location: &GeoLocation) -> Option<Tz> {
    let finder = DefaultFinder::new();
    let name = finder.get_tz_name(location.longitude(), location.latitude());
    if name.is_empty() {
        return None;
    }
    name.parse().ok()
}

pub fn detect_system_timezone() -> Option<Tz> {
    detect_system_timezone_from(
        std::env::var("TZ").ok(),
        Path::new("/etc/localtime"),
        Path::new("/etc/timezone"),
    )
}

/// Try the `TZ` variable, the `/etc/localtime` symlink target, then the
/// Debian-style `/etc/timezone` file.
pub fn detect_system_timezone_from(
    tz_env: Option<String>,
    localtime: &Path,
    timezone_file: &Path,
) -> Option<Tz> {
    if let Some(value) = tz_env
        && let Ok(tz) = value.trim().trim_start_matches(':').parse::<Tz>()
    {
        return Some(tz);
    }

    if let Ok(target) = std::fs::read_link(localtime)
        && let Some(tz) = zone_from_zoneinfo_path(&target.to_string_lossy())
    {
        return Some(tz);
    }

    std::fs::read_to_string(timezone_file)
        .ok()
        .and_then(|content| content.trim().parse().ok())
}

fn zone_from_zoneinfo_path(path: &str) -> Option<Tz> {
    let (_, name) = path.split_once("zoneinfo/")?;
    name.trim_start_matches("posix/").parse().ok()
}

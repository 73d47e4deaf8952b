//! Coordinate notation parsing.
//!
//! Accepts plain signed decimals (`-79.38`) and hemisphere notation
//! (`79.38W`, `43.65 N`). A hemisphere letter combined with an explicit sign
//! is rejected as ambiguous.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{MAXIMUM_LATITUDE, MAXIMUM_LONGITUDE, MINIMUM_LATITUDE, MINIMUM_LONGITUDE};
use crate::error::{Error, Result};

static COORDINATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)(\d+(?:\.\d+)?)\s*([NSEWnsew]?)$").expect("coordinate regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn name(&self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }

    fn bounds(&self) -> (f64, f64) {
        match self {
            Axis::Latitude => (MINIMUM_LATITUDE, MAXIMUM_LATITUDE),
            Axis::Longitude => (MINIMUM_LONGITUDE, MAXIMUM_LONGITUDE),
        }
    }
}

/// Parse one coordinate into signed decimal degrees.
pub fn parse_coordinate(text: &str, axis: Axis) -> Result<f64> {
    let trimmed = text.trim();
    let captures = COORDINATE_RE.captures(trimmed).ok_or_else(|| {
        Error::validation(format!("invalid {} '{}'", axis.name(), text))
    })?;

    let sign = &captures[1];
    let magnitude: f64 = captures[2]
        .parse()
        .map_err(|_| Error::validation(format!("invalid {} '{}'", axis.name(), text)))?;
    let hemisphere = captures[3].to_ascii_uppercase();

    let value = match (hemisphere.as_str(), axis) {
        ("", _) if sign == "-" => -magnitude,
        ("", _) => magnitude,
        (_, _) if !sign.is_empty() => {
            return Err(Error::validation(format!(
                "{} '{}' mixes a sign with a hemisphere letter",
                axis.name(),
                text
            )));
        }
        ("N", Axis::Latitude) | ("E", Axis::Longitude) => magnitude,
        ("S", Axis::Latitude) | ("W", Axis::Longitude) => -magnitude,
        (letter, _) => {
            return Err(Error::validation(format!(
                "hemisphere '{letter}' does not apply to {}",
                axis.name()
            )));
        }
    };

    let (min, max) = axis.bounds();
    if !(min..=max).contains(&value) {
        return Err(Error::validation(format!(
            "{} must be between {min} and {max} degrees (got {value})",
            axis.name()
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hemisphere_notation() {
        assert_eq!(parse_coordinate("43.65N", Axis::Latitude).unwrap(), 43.65);
        assert_eq!(parse_coordinate("33.87s", Axis::Latitude).unwrap(), -33.87);
        assert_eq!(parse_coordinate("79.38W", Axis::Longitude).unwrap(), -79.38);
        assert_eq!(parse_coordinate(" 151.2 E ", Axis::Longitude).unwrap(), 151.2);
    }

    #[test]
    fn test_plain_decimals() {
        assert_eq!(parse_coordinate("-79.38", Axis::Longitude).unwrap(), -79.38);
        assert_eq!(parse_coordinate("+12", Axis::Latitude).unwrap(), 12.0);
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "north", "43.65X", "-43.65N", "12.3.4", "N43"] {
            assert!(
                matches!(parse_coordinate(bad, Axis::Latitude), Err(Error::Validation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_rejects_wrong_axis_letter_and_range() {
        assert!(parse_coordinate("10E", Axis::Latitude).is_err());
        assert!(parse_coordinate("10N", Axis::Longitude).is_err());
        assert!(parse_coordinate("95N", Axis::Latitude).is_err());
        assert!(parse_coordinate("181W", Axis::Longitude).is_err());
    }
}

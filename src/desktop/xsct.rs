//! Screen temperature and brightness through the `xsct` tool.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ApplyError, DesktopStateGateway, ScreenReading};
use crate::scheduler::CommandRunner;

const XSCT: &str = "xsct";

/// `Screen 0: temperature ~ 6500 1.000000`
static COMBINED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)temperature\s+~\s+(\d+)\s+([\d.]+)").expect("xsct regex is valid")
});
static TEMPERATURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:temperature|temp)\s*[:~]?\s*(\d+)K?").expect("xsct regex is valid")
});
static BRIGHTNESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:brightness|bright)\s*[:~]?\s*([\d.]+)").expect("xsct regex is valid")
});

pub struct XsctGateway<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> XsctGateway<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl DesktopStateGateway for XsctGateway<'_> {
    fn get_state(&self) -> Result<ScreenReading, ApplyError> {
        let output = self
            .runner
            .run(XSCT, &[], None)
            .map_err(|source| ApplyError::Spawn {
                program: XSCT.to_string(),
                source,
            })?;

        if !output.success() {
            let stderr = output.stderr.to_lowercase();
            if ["unknown", "usage:", "failed"]
                .iter()
                .any(|needle| stderr.contains(needle))
            {
                log_debug!("xsct reports no active adjustment");
                return Ok(ScreenReading::default());
            }
            return Err(ApplyError::CommandFailed {
                program: XSCT.to_string(),
                summary: output.failure_summary(),
            });
        }

        Ok(parse_xsct_output(&output.stdout))
    }

    fn apply_state(&self, temperature_k: u32, brightness: f64) -> Result<(), ApplyError> {
        let temperature = temperature_k.to_string();
        let brightness = format!("{brightness:.2}");
        let output = self
            .runner
            .run(XSCT, &[temperature.as_str(), brightness.as_str()], None)
            .map_err(|source| ApplyError::Spawn {
                program: XSCT.to_string(),
                source,
            })?;

        if output.success() {
            Ok(())
        } else {
            Err(ApplyError::CommandFailed {
                program: XSCT.to_string(),
                summary: output.failure_summary(),
            })
        }
    }
}

/// Read temperature and brightness from `xsct` output. The single-line
/// layout is tried first, then each value on its own.
pub fn parse_xsct_output(stdout: &str) -> ScreenReading {
    if let Some(captures) = COMBINED_RE.captures(stdout) {
        let reading = ScreenReading {
            temperature_k: captures[1].parse().ok(),
            brightness: captures[2].parse().ok(),
        };
        if reading.temperature_k.is_some() && reading.brightness.is_some() {
            return reading;
        }
    }

    ScreenReading {
        temperature_k: TEMPERATURE_RE
            .captures(stdout)
            .and_then(|c| c[1].parse().ok()),
        brightness: BRIGHTNESS_RE
            .captures(stdout)
            .and_then(|c| c[1].parse().ok()),
    }
}

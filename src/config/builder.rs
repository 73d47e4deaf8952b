//! Default configuration file generation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::*;

/// Write a commented default configuration to `path`, creating its parent
/// directory if needed.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = ConfigBuilder::new()
        .add_section("location")
        .add_setting(
            "latitude",
            &format!("{DEFAULT_LATITUDE}"),
            "Decimal degrees or notation such as \"43.65N\"",
        )
        .add_setting(
            "longitude",
            &format!("{DEFAULT_LONGITUDE}"),
            "Decimal degrees or notation such as \"79.38W\"",
        )
        .add_setting(
            "timezone",
            &format!("\"{DEFAULT_TIMEZONE}\""),
            "IANA zone; remove to derive it from the coordinates",
        )
        .add_section("schedule")
        .add_setting(
            "horizon_days",
            &DEFAULT_HORIZON_DAYS.to_string(),
            &format!("Days of events to queue ({MINIMUM_HORIZON_DAYS}-{MAXIMUM_HORIZON_DAYS})"),
        )
        .add_section("transition")
        .add_setting(
            "enabled",
            &DEFAULT_TRANSITIONS_ENABLED.to_string(),
            "Fade gradually ahead of each sunrise and sunset",
        )
        .add_setting(
            "fade_duration_minutes",
            &DEFAULT_FADE_DURATION_MINUTES.to_string(),
            &format!("Fade length in minutes (0-{MAXIMUM_FADE_DURATION_MINUTES} | 0 = no fade)"),
        )
        .add_setting(
            "fade_offset_minutes",
            &DEFAULT_FADE_OFFSET_MINUTES.to_string(),
            "Move the end of the fade relative to the event",
        )
        .add_setting(
            "step_interval_seconds",
            &DEFAULT_STEP_INTERVAL_SECONDS.to_string(),
            &format!(
                "Seconds between fade steps ({MINIMUM_STEP_INTERVAL_SECONDS}-{MAXIMUM_STEP_INTERVAL_SECONDS})"
            ),
        )
        .add_section("day")
        .add_setting(
            "temperature",
            &DEFAULT_DAY_TEMP.to_string(),
            &format!("Kelvin ({MINIMUM_TEMP}-{MAXIMUM_TEMP})"),
        )
        .add_setting(
            "brightness",
            &format!("{DEFAULT_DAY_BRIGHTNESS:.2}"),
            "Within the [screen] brightness range",
        )
        .add_section("night")
        .add_setting(
            "temperature",
            &DEFAULT_NIGHT_TEMP.to_string(),
            &format!("Kelvin ({MINIMUM_TEMP}-{MAXIMUM_TEMP})"),
        )
        .add_setting(
            "brightness",
            &format!("{DEFAULT_NIGHT_BRIGHTNESS:.2}"),
            "Within the [screen] brightness range",
        )
        .add_section("screen")
        .add_setting(
            "min_brightness",
            &format!("{MINIMUM_BRIGHTNESS:.1}"),
            "Lowest brightness a fade step may set",
        )
        .add_setting(
            "max_brightness",
            &format!("{MAXIMUM_BRIGHTNESS:.1}"),
            "Highest brightness a fade step may set",
        )
        .build();

    fs::write(path, content).context("Failed to write default config file")?;
    log_indented!("Created default configuration at {}", path.display());
    Ok(())
}

/// Lines of a TOML file with their trailing comments aligned.
struct ConfigBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, name: &str) -> Self {
        self.entries.push(Entry::Section(format!("[{name}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.len()),
                Entry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Section(header) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(header);
                }
                Entry::Setting { line, comment } => {
                    lines.push(format!("{line:<width$}{comment}"));
                }
            }
        }

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_aligns_comments() {
        let content = ConfigBuilder::new()
            .add_section("a")
            .add_setting("x", "1", "short")
            .add_setting("longer_key", "true", "long")
            .build();

        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "[a]");
        assert_eq!(lines[1].find('#'), lines[2].find('#'));
        assert_eq!(lines[2], "longer_key = true # long");
    }
}

//! Per-mode systemd user timers that start the gradual fade.
//!
//! There is exactly one timer file per mode, `sundial-fade@<mode>.timer`,
//! pointing at an instance of the `sundial-fade@.service` template. Files are
//! rewritten whole and only when their rendered text differs from what is
//! on disk, so a pass that computes the same instant causes no daemon reload.
//!
//! A batch that fails part-way removes the timers it wrote before returning
//! the error: nothing scheduled is preferred over a half-scheduled fade.

use chrono::{DateTime, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{CommandRunner, Invocation, systemctl_user};
use crate::constants::{FADE_SERVICE_TEMPLATE, FADE_SUBCOMMAND, FADE_TIMER_PREFIX};
use crate::error::{Error, Result};
use crate::mode::Mode;

/// A timer as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTimer {
    pub mode: Mode,
    pub on_calendar: Option<String>,
}

pub struct DynamicTimerManager<'a> {
    runner: &'a dyn CommandRunner,
    unit_dir: PathBuf,
    invocation: Invocation,
}

impl<'a> DynamicTimerManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, unit_dir: PathBuf, invocation: Invocation) -> Self {
        Self {
            runner,
            unit_dir,
            invocation,
        }
    }

    /// `~/.config/systemd/user`
    pub fn default_unit_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("systemd").join("user"))
            .ok_or_else(|| Error::scheduler("could not determine the user config directory"))
    }

    pub fn timer_name(mode: Mode) -> String {
        format!("{FADE_TIMER_PREFIX}{mode}.timer")
    }

    pub fn service_instance(mode: Mode) -> String {
        format!("{FADE_TIMER_PREFIX}{mode}.service")
    }

    pub fn render_timer(mode: Mode, instant: DateTime<Utc>) -> String {
        format!(
            "# Written by sundial. Rewritten on every scheduling pass.\n\
             [Unit]\n\
             Description=Start the sundial fade to {mode} mode\n\
             \n\
             [Timer]\n\
             Unit={service}\n\
             OnCalendar={calendar} UTC\n\
             AccuracySec=1s\n\
             Persistent=false\n\
             \n\
             [Install]\n\
             WantedBy=timers.target\n",
            service = Self::service_instance(mode),
            calendar = instant.format("%Y-%m-%d %H:%M:%S"),
        )
    }

    pub fn render_service_template(invocation: &Invocation) -> String {
        let exec: Vec<String> = invocation
            .words(&[FADE_SUBCOMMAND, "--mode"])
            .map(|word| systemd_quote(&word))
            .collect();
        format!(
            "# Written by sundial.\n\
             [Unit]\n\
             Description=sundial gradual fade to %i mode\n\
             \n\
             [Service]\n\
             Type=oneshot\n\
             ExecStart={} %i\n",
            exec.join(" ")
        )
    }

    fn timer_path(&self, mode: Mode) -> PathBuf {
        self.unit_dir.join(Self::timer_name(mode))
    }

    /// Schedule a single fade. Returns whether anything changed on disk.
    pub fn write(&self, mode: Mode, instant: DateTime<Utc>) -> Result<bool> {
        Ok(self.write_batch(&[(mode, instant)])? > 0)
    }

    /// Write every timer in `units`, reload once if any changed, then enable
    /// and start the changed ones. Returns how many timers changed.
    pub fn write_batch(&self, units: &[(Mode, DateTime<Utc>)]) -> Result<usize> {
        fs::create_dir_all(&self.unit_dir).map_err(|e| {
            Error::scheduler_io(format!("failed to create {}", self.unit_dir.display()), e)
        })?;

        let template_changed = write_if_changed(
            &self.unit_dir.join(FADE_SERVICE_TEMPLATE),
            &Self::render_service_template(&self.invocation),
        )?;

        let mut changed: Vec<Mode> = Vec::new();
        for &(mode, instant) in units {
            match write_if_changed(&self.timer_path(mode), &Self::render_timer(mode, instant)) {
                Ok(true) => {
                    log_decorated!(
                        "Fade to {mode} scheduled at {}",
                        instant.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                    changed.push(mode);
                }
                Ok(false) => log_debug!("{} unchanged", Self::timer_name(mode)),
                Err(e) => {
                    self.roll_back(&changed);
                    return Err(e);
                }
            }
        }

        if changed.is_empty() && !template_changed {
            return Ok(0);
        }

        if let Err(e) = systemctl_user(self.runner, &["daemon-reload"]) {
            self.roll_back(&changed);
            return Err(e);
        }

        for &mode in &changed {
            let name = Self::timer_name(mode);
            if let Err(e) = systemctl_user(self.runner, &["enable", "--now", name.as_str()]) {
                self.roll_back(&changed);
                return Err(e);
            }
        }

        Ok(changed.len())
    }

    fn roll_back(&self, written: &[Mode]) {
        if written.is_empty() {
            return;
        }
        log_warning!("Removing fade timers written by the failed batch");
        for &mode in written {
            self.remove_unit(mode);
        }
        self.reload_quietly();
    }

    /// Stop, disable and delete one mode's timer. Never fails.
    pub fn remove(&self, mode: Mode) {
        if self.remove_unit(mode) {
            self.reload_quietly();
        }
    }

    /// Remove both timers, e.g. when fades are turned off.
    pub fn disable_all(&self) {
        let mut deleted = false;
        for mode in Mode::ALL {
            deleted |= self.remove_unit(mode);
        }
        if deleted {
            log_decorated!("Fade timers removed");
            self.reload_quietly();
        }
    }

    /// Returns whether a file was deleted.
    fn remove_unit(&self, mode: Mode) -> bool {
        let name = Self::timer_name(mode);

        for action in [&["stop", name.as_str()][..], &["disable", name.as_str()][..]] {
            if let Err(e) = systemctl_user(self.runner, action) {
                log_debug!("Ignoring: {e}");
            }
        }

        let deleted = match fs::remove_file(self.timer_path(mode)) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                log_warning!("Could not delete {name}: {e}");
                false
            }
        };

        if let Err(e) = systemctl_user(self.runner, &["reset-failed", name.as_str()]) {
            log_debug!("Ignoring: {e}");
        }

        deleted
    }

    fn reload_quietly(&self) {
        if let Err(e) = systemctl_user(self.runner, &["daemon-reload"]) {
            log_warning!("daemon-reload after timer removal failed: {e}");
        }
    }

    /// Timers present in the unit directory.
    pub fn installed(&self) -> Vec<InstalledTimer> {
        Mode::ALL
            .into_iter()
            .filter_map(|mode| {
                let content = fs::read_to_string(self.timer_path(mode)).ok()?;
                let on_calendar = content
                    .lines()
                    .find_map(|line| line.strip_prefix("OnCalendar="))
                    .map(str::to_string);
                Some(InstalledTimer { mode, on_calendar })
            })
            .collect()
    }
}

/// Replace `path` with `content` unless it already holds exactly that text.
fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log_debug!("Could not read {}: {e}", path.display()),
    }

    let dir = path.parent().unwrap_or(Path::new("."));
    let write_error = |e: std::io::Error| {
        Error::scheduler_io(format!("failed to write {}", path.display()), e)
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(content.as_bytes()).map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(true)
}

/// Quote one word for a systemd `ExecStart=` line.
fn systemd_quote(word: &str) -> String {
    let escaped = word
        .replace('\\', r"\\")
        .replace('"', "\\\"")
        .replace('%', "%%");
    format!("\"{escaped}\"")
}

//! Capture of the graphical session environment for queued jobs.
//!
//! `atd` starts jobs outside the user's session, so a job needs the display
//! identifier, auth cookie and session bus address exported explicitly. The
//! user's systemd manager holds the session environment: it is read over
//! D-Bus, falling back to `systemctl --user show-environment`.

use anyhow::Context;
use zbus::blocking::Connection;

use super::{CommandRunner, systemctl_user};
use crate::constants::{REQUIRED_SESSION_VARS, SESSION_ENV_VARS};
use crate::error::{Error, Result};

#[zbus::proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1"
)]
trait SystemdManager {
    /// `KEY=VALUE` assignments passed to user units.
    #[zbus(property)]
    fn environment(&self) -> zbus::Result<Vec<String>>;
}

/// Session variables in a stable order, values unescaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnvironment {
    vars: Vec<(String, String)>,
}

impl SessionEnvironment {
    /// Keep only the session variables from `KEY=VALUE` assignments.
    pub fn from_assignments<I, S>(assignments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut found: Vec<(String, String)> = Vec::new();
        for assignment in assignments {
            let Some((key, value)) = assignment.as_ref().split_once('=') else {
                continue;
            };
            if SESSION_ENV_VARS.contains(&key) && !value.is_empty() {
                found.retain(|(existing, _)| existing != key);
                found.push((key.to_string(), value.to_string()));
            }
        }

        found.sort_by_key(|(key, _)| SESSION_ENV_VARS.iter().position(|k| *k == key.as_str()));
        Self { vars: found }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables the jobs need but the session did not provide.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_SESSION_VARS
            .iter()
            .copied()
            .filter(|key| self.get(key).is_none())
            .collect()
    }

    /// `export KEY='value'` lines ready to prepend to a job body.
    pub fn export_lines(&self) -> String {
        self.vars
            .iter()
            .map(|(key, value)| format!("export {key}={}\n", shell_quote(value)))
            .collect()
    }
}

/// Quote `value` for POSIX `sh` so it is taken literally.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Where job environments come from.
pub trait EnvironmentSource {
    fn capture(&self, runner: &dyn CommandRunner) -> Result<SessionEnvironment>;
}

/// The user's systemd manager, over D-Bus with a `systemctl` fallback.
#[derive(Debug, Clone, Copy)]
pub struct ServiceManagerEnvironment {
    use_dbus: bool,
}

impl ServiceManagerEnvironment {
    pub const fn new() -> Self {
        Self { use_dbus: true }
    }

    /// Skip D-Bus and read `systemctl --user show-environment` only.
    pub const fn systemctl_only() -> Self {
        Self { use_dbus: false }
    }
}

impl Default for ServiceManagerEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentSource for ServiceManagerEnvironment {
    fn capture(&self, runner: &dyn CommandRunner) -> Result<SessionEnvironment> {
        let from_dbus = if self.use_dbus {
            environment_over_dbus()
                .inspect_err(|e| {
                    log_debug!("D-Bus environment query failed ({e:#}), asking systemctl instead")
                })
                .ok()
        } else {
            None
        };

        let assignments = match from_dbus {
            Some(assignments) => assignments,
            None => systemctl_user(runner, &["show-environment"])?
                .stdout
                .lines()
                .map(str::to_string)
                .collect(),
        };

        let environment = SessionEnvironment::from_assignments(assignments);
        if environment.is_empty() {
            return Err(Error::scheduler(
                "the user session manager exported no display variables",
            ));
        }

        let missing = environment.missing_required();
        if !missing.is_empty() {
            log_warning!(
                "Session environment lacks {}; scheduled changes may not reach the display",
                missing.join(", ")
            );
        }

        Ok(environment)
    }
}

fn environment_over_dbus() -> anyhow::Result<Vec<String>> {
    let connection = Connection::session().context("Failed to connect to session D-Bus")?;
    let proxy = SystemdManagerProxyBlocking::new(&connection)
        .context("Failed to create systemd manager proxy")?;
    proxy
        .environment()
        .context("Failed to read the manager's Environment property")
}

//! Tagged one-shot jobs in the `at` queue.
//!
//! Each planned event becomes one job that exports the captured session
//! environment, runs `internal-apply --mode <mode>` and ends with the marker
//! comment. Listing reads every pending job body and keeps only marked ones,
//! so unrelated jobs in the same queue are never touched.
//!
//! Scheduling replaces rather than adds: marked jobs are removed before new
//! ones are submitted. Submissions are independent calls and a failure in one
//! does not stop the rest.

use chrono::Local;

use super::environment::{EnvironmentSource, shell_quote};
use super::parse::{self, QueueEntry};
use super::timers::DynamicTimerManager;
use super::{CommandRunner, Invocation, require_at_daemon, require_programs};
use crate::constants::{APPLY_SUBCOMMAND, AT_BINARIES, JOB_MARKER};
use crate::error::{Error, Result};
use crate::geo::SolarEvent;
use crate::mode::Mode;

/// A pending job created by this application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedJob {
    pub id: String,
    pub time: String,
    /// `None` when the body no longer names a recognisable mode.
    pub mode: Option<Mode>,
}

impl TaggedJob {
    pub fn mode_label(&self) -> &'static str {
        self.mode.map_or("unknown", |mode| mode.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearOutcome {
    pub removed: usize,
    pub failed: usize,
    pub listing_failed: bool,
}

impl ClearOutcome {
    /// A clear fails only when the queue could not be listed or every
    /// removal attempt failed.
    pub fn success(&self) -> bool {
        !self.listing_failed && (self.failed == 0 || self.removed > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub id: Option<String>,
    pub mode: Mode,
    /// The local wall-clock time handed to `at`.
    pub at_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub submitted: Vec<SubmittedJob>,
    pub failed: usize,
}

pub struct AtQueueScheduler<'a> {
    runner: &'a dyn CommandRunner,
    environment: &'a dyn EnvironmentSource,
    timers: Option<&'a DynamicTimerManager<'a>>,
}

impl<'a> AtQueueScheduler<'a> {
    /// Fails with a dependency error when the `at` tools are missing or the
    /// daemon is not running.
    pub fn new(
        runner: &'a dyn CommandRunner,
        environment: &'a dyn EnvironmentSource,
        timers: Option<&'a DynamicTimerManager<'a>>,
    ) -> Result<Self> {
        require_programs(runner, AT_BINARIES)?;
        require_at_daemon(runner)?;
        Ok(Self {
            runner,
            environment,
            timers,
        })
    }

    /// Pending jobs carrying the marker.
    pub fn list_tagged(&self) -> Result<Vec<TaggedJob>> {
        let output = self
            .runner
            .run("atq", &[], None)
            .map_err(|e| Error::scheduler_io("failed to run atq", e))?;
        if !output.success() {
            return Err(Error::scheduler(format!(
                "atq failed ({})",
                output.failure_summary()
            )));
        }

        let mut tagged = Vec::new();
        for QueueEntry { id, time } in parse::parse_atq_output(&output.stdout) {
            let body = match self.runner.run("at", &["-c", id.as_str()], None) {
                Ok(out) if out.success() => out.stdout,
                Ok(out) => {
                    log_debug!("Skipping job {id}: {}", out.failure_summary());
                    continue;
                }
                Err(e) => {
                    log_debug!("Skipping job {id}: {e}");
                    continue;
                }
            };

            if parse::is_tagged(&body) {
                tagged.push(TaggedJob {
                    mode: parse::parse_job_mode(&body),
                    id,
                    time,
                });
            }
        }

        Ok(tagged)
    }

    /// Remove every marked job and both fade timers. Failures are logged and
    /// counted; this never returns an error.
    pub fn clear(&self) -> ClearOutcome {
        let outcome = self.clear_jobs();
        if let Some(timers) = self.timers {
            timers.disable_all();
        }
        outcome
    }

    fn clear_jobs(&self) -> ClearOutcome {
        let jobs = match self.list_tagged() {
            Ok(jobs) => jobs,
            Err(e) => {
                log_warning!("Could not list scheduled jobs: {e}");
                return ClearOutcome {
                    listing_failed: true,
                    ..ClearOutcome::default()
                };
            }
        };

        let mut outcome = ClearOutcome::default();
        for job in jobs {
            match self.runner.run("atrm", &[job.id.as_str()], None) {
                Ok(out) if out.success() => {
                    log_debug!("Removed job {} ({})", job.id, job.mode_label());
                    outcome.removed += 1;
                }
                Ok(out) => {
                    log_warning!("Could not remove job {}: {}", job.id, out.failure_summary());
                    outcome.failed += 1;
                }
                Err(e) => {
                    log_warning!("Could not remove job {}: {e}", job.id);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Replace the marked jobs with one job per event.
    ///
    /// Only the job queue is cleared here; the fade timers are rewritten or
    /// disabled by the caller in the same pass, where unchanged files are
    /// left alone.
    pub fn schedule(&self, events: &[SolarEvent], invocation: &Invocation) -> Result<ScheduleOutcome> {
        let cleared = self.clear_jobs();
        if cleared.removed > 0 {
            log_decorated!("Removed {} previously scheduled jobs", cleared.removed);
        }

        if events.is_empty() {
            return Err(Error::scheduler("no future solar events to schedule"));
        }

        let environment = self.environment.capture(self.runner)?;
        let exports = environment.export_lines();

        let mut outcome = ScheduleOutcome::default();
        for event in events {
            let mode = event.mode();
            let at_time = event.instant.with_timezone(&Local);
            let stamp = at_time.format("%Y%m%d%H%M.%S").to_string();
            let body = job_body(&exports, invocation, mode);

            match self.runner.run("at", &["-t", stamp.as_str()], Some(&body)) {
                Ok(out) if out.success() => {
                    let id = parse::parse_submitted_job_id(&out.stderr);
                    log_decorated!(
                        "{} job {} at {}",
                        mode,
                        id.as_deref().unwrap_or("?"),
                        at_time.format("%Y-%m-%d %H:%M:%S")
                    );
                    outcome.submitted.push(SubmittedJob {
                        id,
                        mode,
                        at_time: at_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    });
                }
                Ok(out) => {
                    log_error!("Failed to queue {mode} job: {}", out.failure_summary());
                    outcome.failed += 1;
                }
                Err(e) => {
                    log_error!("Failed to queue {mode} job: {e}");
                    outcome.failed += 1;
                }
            }
        }

        if outcome.submitted.is_empty() {
            return Err(Error::scheduler(format!(
                "all {} job submissions failed",
                outcome.failed
            )));
        }

        Ok(outcome)
    }
}

fn job_body(exports: &str, invocation: &Invocation, mode: Mode) -> String {
    let command: Vec<String> = invocation
        .words(&[APPLY_SUBCOMMAND, "--mode", mode.as_str()])
        .map(|word| shell_quote(&word))
        .collect();
    format!("{exports}{}\n{JOB_MARKER}\n", command.join(" "))
}

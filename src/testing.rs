//! In-memory stand-ins for the OS facilities, used by unit and integration tests.
//!
//! [`FakeRunner`] emulates `at`, `atq`, `atrm` and `systemctl` closely enough
//! for the queue and timer logic to run unmodified, and records every call.
//! [`ManualClock`] advances only when the code under test sleeps, and
//! [`RecordingGateway`] keeps every screen value it is asked to apply.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use crate::desktop::{ApplyError, DesktopStateGateway, ScreenReading};
use crate::scheduler::{CommandOutput, CommandRunner};
use crate::time_source::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeJob {
    pub id: String,
    pub time: String,
    pub body: String,
}

#[derive(Default)]
struct QueueState {
    jobs: BTreeMap<u32, FakeJob>,
    next_id: u32,
    calls: Vec<String>,
}

pub struct FakeRunner {
    state: RefCell<QueueState>,
    missing: HashSet<String>,
    at_daemon_active: bool,
    session_environment: String,
    failures: Vec<(String, String)>,
    responses: HashMap<String, CommandOutput>,
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(QueueState {
                next_id: 1,
                ..QueueState::default()
            }),
            missing: HashSet::new(),
            at_daemon_active: true,
            session_environment: "DISPLAY=:0\nXAUTHORITY=/home/tester/.Xauthority\nLANG=C\n"
                .to_string(),
            failures: Vec::new(),
            responses: HashMap::new(),
        }
    }

    pub fn without_program(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    pub fn with_at_daemon_active(mut self, active: bool) -> Self {
        self.at_daemon_active = active;
        self
    }

    pub fn with_session_environment(mut self, assignments: &str) -> Self {
        self.session_environment = assignments.to_string();
        self
    }

    /// Make every call to `program` whose arguments include `arg` fail.
    pub fn failing_on(mut self, program: &str, arg: &str) -> Self {
        self.failures.push((program.to_string(), arg.to_string()));
        self
    }

    /// Answer every call to `program` with `output`.
    pub fn with_response(mut self, program: &str, output: CommandOutput) -> Self {
        self.responses.insert(program.to_string(), output);
        self
    }

    /// Seed a job that this application did not create.
    pub fn with_job(self, time: &str, body: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.jobs.insert(
                id,
                FakeJob {
                    id: id.to_string(),
                    time: time.to_string(),
                    body: body.to_string(),
                },
            );
        }
        self
    }

    pub fn jobs(&self) -> Vec<FakeJob> {
        self.state.borrow().jobs.values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Number of recorded calls whose command line contains `fragment`.
    pub fn count_calls(&self, fragment: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.contains(fragment))
            .count()
    }

    fn ok(stdout: impl Into<String>, stderr: impl Into<String>) -> CommandOutput {
        CommandOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    fn fail(stderr: impl Into<String>) -> CommandOutput {
        CommandOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn at(&self, args: &[&str], stdin: Option<&str>) -> CommandOutput {
        let mut state = self.state.borrow_mut();
        match args {
            ["-c", id] => match id.parse::<u32>().ok().and_then(|n| state.jobs.get(&n)) {
                Some(job) => Self::ok(job.body.clone(), ""),
                None => Self::fail(format!("Cannot find jobid {id}")),
            },
            ["-t", stamp] => {
                let Ok(when) = NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M.%S") else {
                    return Self::fail("Garbled time");
                };
                let time = when.format("%a %b %e %H:%M:%S %Y").to_string();
                let id = state.next_id;
                state.next_id += 1;
                state.jobs.insert(
                    id,
                    FakeJob {
                        id: id.to_string(),
                        time: time.clone(),
                        body: stdin.unwrap_or_default().to_string(),
                    },
                );
                Self::ok(
                    "",
                    format!("warning: commands will be executed using /bin/sh\njob {id} at {time}\n"),
                )
            }
            _ => Self::fail("usage: at [-t time] | -c job"),
        }
    }

    fn atq(&self) -> CommandOutput {
        let listing: String = self
            .state
            .borrow()
            .jobs
            .values()
            .map(|job| format!("{}\t{} a tester\n", job.id, job.time))
            .collect();
        Self::ok(listing, "")
    }

    fn atrm(&self, args: &[&str]) -> CommandOutput {
        let mut state = self.state.borrow_mut();
        for id in args {
            let removed = id
                .parse::<u32>()
                .ok()
                .and_then(|n| state.jobs.remove(&n));
            if removed.is_none() {
                return Self::fail(format!("Cannot find jobid {id}"));
            }
        }
        Self::ok("", "")
    }

    fn systemctl(&self, args: &[&str]) -> CommandOutput {
        if args.contains(&"is-active") {
            return if self.at_daemon_active {
                Self::ok("", "")
            } else {
                CommandOutput {
                    status: Some(3),
                    ..CommandOutput::default()
                }
            };
        }
        if args.contains(&"show-environment") {
            return Self::ok(self.session_environment.clone(), "");
        }
        Self::ok("", "")
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&str>,
    ) -> std::io::Result<CommandOutput> {
        self.state
            .borrow_mut()
            .calls
            .push(format!("{program} {}", args.join(" ")));

        if self.missing.contains(program) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{program}: not found"),
            ));
        }

        if self
            .failures
            .iter()
            .any(|(p, arg)| p == program && args.iter().any(|a| a.contains(arg.as_str())))
        {
            return Ok(Self::fail("simulated failure"));
        }

        if let Some(output) = self.responses.get(program) {
            return Ok(output.clone());
        }

        Ok(match program {
            "at" => self.at(args, stdin),
            "atq" => self.atq(),
            "atrm" => self.atrm(args),
            "systemctl" => self.systemctl(args),
            other => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{other}: not emulated"),
                ));
            }
        })
    }

    fn exists(&self, program: &str) -> bool {
        !self.missing.contains(program)
    }
}

/// A clock that only moves when slept on or advanced by hand.
pub struct ManualClock {
    wall_start: DateTime<Utc>,
    origin: Instant,
    elapsed: Cell<Duration>,
    sleeps: Cell<usize>,
}

impl ManualClock {
    pub fn new(wall_start: DateTime<Utc>) -> Self {
        Self {
            wall_start,
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.wall_start
            + chrono::Duration::from_std(self.elapsed.get()).unwrap_or(chrono::Duration::zero())
    }

    fn monotonic(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep_until(&self, deadline: Instant, _running: &AtomicBool) {
        self.sleeps.set(self.sleeps.get() + 1);
        let target = deadline.saturating_duration_since(self.origin);
        if target > self.elapsed.get() {
            self.elapsed.set(target);
        }
    }
}

/// A screen that reports a fixed reading and records each apply.
#[derive(Default)]
pub struct RecordingGateway {
    reading: ScreenReading,
    applied: RefCell<Vec<(u32, f64)>>,
    fail_every: Option<usize>,
}

impl RecordingGateway {
    pub fn new(temperature_k: u32, brightness: f64) -> Self {
        Self {
            reading: ScreenReading {
                temperature_k: Some(temperature_k),
                brightness: Some(brightness),
            },
            ..Self::default()
        }
    }

    /// Reject every `n`th apply call.
    pub fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    pub fn applied(&self) -> Vec<(u32, f64)> {
        self.applied.borrow().clone()
    }
}

impl DesktopStateGateway for RecordingGateway {
    fn get_state(&self) -> Result<ScreenReading, ApplyError> {
        Ok(self.reading)
    }

    fn apply_state(&self, temperature_k: u32, brightness: f64) -> Result<(), ApplyError> {
        let mut applied = self.applied.borrow_mut();
        applied.push((temperature_k, brightness));
        match self.fail_every {
            Some(n) if applied.len() % n == 0 => {
                Err(ApplyError::Rejected("simulated failure".to_string()))
            }
            _ => Ok(()),
        }
    }
}

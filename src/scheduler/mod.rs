//! OS scheduling substrates and the command seam they run through.
//!
//! Both substrates shell out to system tools (`at`, `atq`, `atrm`,
//! `systemctl`). Those calls go through [`CommandRunner`] so that the queue
//! and timer logic can be exercised against an in-memory fake.

pub mod at_queue;
pub mod environment;
pub mod parse;
pub mod timers;

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::constants::{AT_DAEMON_UNIT, SYSTEMCTL};
use crate::error::{Error, Result};

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Short description of a failure for log lines.
    pub fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.status, stderr.is_empty()) {
            (Some(code), true) => format!("exit status {code}"),
            (Some(code), false) => format!("exit status {code}: {stderr}"),
            (None, _) => "terminated by signal".to_string(),
        }
    }
}

/// How scheduled triggers call back into this program: the executable plus
/// global flags (such as `--config`) that must precede the subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub global_args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: Option<&Path>) -> Self {
        if let Some(path) = config {
            self.global_args.push("--config".to_string());
            self.global_args.push(path.to_string_lossy().into_owned());
        }
        self
    }

    /// Program and global flags followed by `rest`.
    pub fn words<'a>(&'a self, rest: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.global_args.iter().cloned())
            .chain(rest.iter().map(|word| word.to_string()))
    }
}

pub trait CommandRunner {
    /// Run `program` with `args`, feeding `stdin` if given, and wait for it.
    fn run(&self, program: &str, args: &[&str], stdin: Option<&str>)
    -> std::io::Result<CommandOutput>;

    /// Whether `program` can be found on the search path.
    fn exists(&self, program: &str) -> bool;
}

/// Runs real processes. Calls block until the child exits; there is no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&str>,
    ) -> std::io::Result<CommandOutput> {
        log_debug!("Running: {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // The pipe is dropped before waiting so the child sees EOF, and the
        // child is reaped even when the write fails.
        let written = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe.write_all(input.as_bytes()),
            _ => Ok(()),
        };

        let output = child.wait_with_output()?;
        if let Err(e) = written {
            log_debug!("Writing to {program} failed after it exited with {:?}", output.status.code());
            return Err(e);
        }
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn exists(&self, program: &str) -> bool {
        if program.contains('/') {
            return is_executable(Path::new(program));
        }
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| is_executable(&dir.join(program))))
            .unwrap_or(false)
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Fail with a dependency error naming every program that is missing.
pub fn require_programs(runner: &dyn CommandRunner, programs: &[&str]) -> Result<()> {
    let missing: Vec<&str> = programs
        .iter()
        .copied()
        .filter(|program| !runner.exists(program))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Dependency(format!(
            "required commands not found: {}",
            missing.join(", ")
        )))
    }
}

/// The `at` queue only fires jobs while its daemon runs.
pub fn require_at_daemon(runner: &dyn CommandRunner) -> Result<()> {
    require_programs(runner, &[SYSTEMCTL])?;

    let output = runner
        .run(SYSTEMCTL, &["is-active", "--quiet", AT_DAEMON_UNIT], None)
        .map_err(|e| Error::Dependency(format!("could not query {AT_DAEMON_UNIT}: {e}")))?;

    if output.success() {
        Ok(())
    } else {
        Err(Error::Dependency(format!(
            "the {AT_DAEMON_UNIT} service is not active; enable it with 'sudo systemctl enable --now {AT_DAEMON_UNIT}'"
        )))
    }
}

/// `systemctl --user ...` with the result folded into a scheduler error.
pub(crate) fn systemctl_user(runner: &dyn CommandRunner, args: &[&str]) -> Result<CommandOutput> {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push("--user");
    full.extend_from_slice(args);

    let output = runner
        .run(SYSTEMCTL, &full, None)
        .map_err(|e| Error::scheduler_io(format!("failed to run systemctl {}", args.join(" ")), e))?;

    if output.success() {
        Ok(output)
    } else {
        Err(Error::scheduler(format!(
            "systemctl --user {} failed ({})",
            args.join(" "),
            output.failure_summary()
        )))
    }
}

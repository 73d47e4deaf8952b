//! Command handlers, one module per subcommand.
//!
//! Each handler takes a [`CommandContext`] carrying the loaded configuration
//! and the collaborators it talks to, so the same code runs against real
//! processes in the binary and against fakes in tests.

pub mod apply;
pub mod clear;
pub mod fade;
pub mod help;
pub mod list;
pub mod login_check;
pub mod schedule;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::args::Command;
use crate::config::{self, Config};
use crate::scheduler::environment::{EnvironmentSource, ServiceManagerEnvironment};
use crate::scheduler::timers::DynamicTimerManager;
use crate::scheduler::{CommandRunner, Invocation, SystemRunner};
use crate::time_source::{Clock, SystemClock};

/// Configuration plus the outside world, as seen by a command.
pub struct CommandContext<'a> {
    pub config: &'a Config,
    pub runner: &'a dyn CommandRunner,
    pub clock: &'a dyn Clock,
    pub environment: &'a dyn EnvironmentSource,
    /// How queued jobs and fade timers call back into this program.
    pub invocation: Invocation,
    /// Where fade timer units are written.
    pub unit_dir: PathBuf,
}

impl CommandContext<'_> {
    pub fn timers(&self) -> DynamicTimerManager<'_> {
        DynamicTimerManager::new(self.runner, self.unit_dir.clone(), self.invocation.clone())
    }
}

/// Load the configuration and run `command` against the real system.
pub fn dispatch(command: Command, config_path: Option<&Path>) -> Result<()> {
    if let Command::Help { topic } = &command {
        help::run_help_command(topic.as_deref());
        return Ok(());
    }

    let config = config::load(config_path)?;
    if crate::logger::Log::is_debug() {
        config.log_summary();
    }

    let runner = SystemRunner;
    let clock = SystemClock;
    let environment = ServiceManagerEnvironment::new();

    // Triggers run from another working directory.
    let config_path = config_path.map(|path| path.canonicalize().unwrap_or(path.to_path_buf()));
    let program = std::env::current_exe().context("Could not determine the sundial executable")?;

    let context = CommandContext {
        config: &config,
        runner: &runner,
        clock: &clock,
        environment: &environment,
        invocation: Invocation::new(program).with_config(config_path.as_deref()),
        unit_dir: DynamicTimerManager::default_unit_dir()?,
    };

    match command {
        Command::Schedule => schedule::handle_schedule_command(&context),
        Command::Clear => clear::handle_clear_command(&context),
        Command::List => list::handle_list_command(&context),
        Command::Apply { mode } => apply::handle_apply_command(&context, mode),
        Command::Fade { mode } => fade::handle_fade_command(&context, mode),
        Command::LoginCheck => login_check::handle_login_check_command(&context),
        Command::Help { .. } => Ok(()),
    }
}

//! Usage text for the binary and for each command.

use crate::constants::{APPLY_SUBCOMMAND, FADE_SUBCOMMAND};

pub fn display_version() {
    println!("sundial {}", env!("CARGO_PKG_VERSION"));
}

/// General usage, shown for `--help` and after argument errors.
pub fn display_usage() {
    log_version!();
    log_block_start!("Usage: sundial [OPTIONS] <COMMAND>");
    log_block_start!("Commands:");
    log_indented!("schedule          Queue mode changes and fade timers for upcoming events");
    log_indented!("clear             Remove every scheduled job and fade timer");
    log_indented!("list              Show scheduled jobs and fade timers");
    log_indented!("run-login-check   Apply the mode for the current time of day");
    log_indented!("help [COMMAND]    Show help for a command");
    log_block_start!("Options:");
    log_indented!("-c, --config <PATH>  Use this configuration file");
    log_indented!("-d, --debug          Show detailed output");
    log_indented!("-h, --help           Print help");
    log_indented!("-V, --version        Print version");
    log_end!();
}

pub fn run_help_command(topic: Option<&str>) {
    match topic {
        None => display_usage(),
        Some("schedule") => command_help(
            "schedule",
            "Plan sunrise and sunset events over the configured horizon, replace \
             previously queued jobs, and write the fade timers.",
        ),
        Some("clear") => command_help(
            "clear",
            "Remove the jobs and fade timers created by sundial. Other jobs in \
             the queue are left alone.",
        ),
        Some("list") => command_help("list", "Show pending sundial jobs and installed fade timers."),
        Some("run-login-check") => command_help(
            "run-login-check",
            "Apply day mode between today's sunrise and sunset and night mode \
             otherwise. Meant to run at login.",
        ),
        Some(command) if command == APPLY_SUBCOMMAND => command_help(
            &format!("{APPLY_SUBCOMMAND} --mode <day|night>"),
            "Apply a mode's screen profile. Run by queued jobs.",
        ),
        Some(command) if command == FADE_SUBCOMMAND => command_help(
            &format!("{FADE_SUBCOMMAND} --mode <day|night>"),
            "Fade from the current screen state to a mode's profile. Run by \
             the fade timers.",
        ),
        Some(unknown) => {
            log_pipe!();
            log_warning!("Unknown command: {unknown}");
            display_usage();
        }
    }
}

fn command_help(usage: &str, description: &str) {
    log_version!();
    log_block_start!("Usage: sundial {usage}");
    log_decorated!("{description}");
    log_end!();
}

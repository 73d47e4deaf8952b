//! Entry point: parse the command line, run one command, map the outcome to
//! an exit status.
//!
//! Each invocation is short-lived. `schedule` is typically run at login and
//! daily; the jobs and timers it creates call back into `internal-apply` and
//! `fade`.

use sundial::args::{CliAction, ParsedArgs};
use sundial::commands::{self, help};
use sundial::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use sundial::logger::Log;
use sundial::{log_end, log_error_exit, log_indented, log_pipe, log_warning};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let code = match parsed_args.action {
        CliAction::ShowVersion => {
            help::display_version();
            EXIT_SUCCESS
        }
        CliAction::ShowHelp => {
            help::display_usage();
            EXIT_SUCCESS
        }
        CliAction::ShowHelpDueToError(message) => {
            log_pipe!();
            log_warning!("{message}");
            help::display_usage();
            EXIT_FAILURE
        }
        CliAction::Run {
            command,
            debug_enabled,
            config_path,
        } => {
            Log::set_debug(debug_enabled);
            match commands::dispatch(command, config_path.as_deref()) {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    log_error_exit!("{e}");
                    for cause in e.chain().skip(1) {
                        log_indented!("caused by: {cause}");
                    }
                    log_end!();
                    EXIT_FAILURE
                }
            }
        }
    };

    std::process::exit(code);
}

//! Command-line argument parsing.
//!
//! Global flags (`--debug`, `--config <path>`, `--help`, `--version`) may
//! appear anywhere. The first bare word names the command; `internal-apply`
//! and `fade` also take `--mode day|night`.

use std::path::PathBuf;

use crate::constants::{APPLY_SUBCOMMAND, FADE_SUBCOMMAND};
use crate::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Schedule,
    Clear,
    List,
    Apply { mode: Mode },
    Fade { mode: Mode },
    LoginCheck,
    Help { topic: Option<String> },
}

/// What the process should do after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run {
        command: Command,
        debug_enabled: bool,
        config_path: Option<PathBuf>,
    },
    ShowHelp,
    ShowVersion,
    /// Bad arguments; the message names the problem.
    ShowHelpDueToError(String),
}

pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    /// Parse `std::env::args()`-style input, including the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let action = match Self::parse_action(&args) {
            Ok(action) => action,
            Err(message) => CliAction::ShowHelpDueToError(message),
        };
        ParsedArgs { action }
    }

    fn parse_action(args: &[String]) -> Result<CliAction, String> {
        let mut debug_enabled = false;
        let mut show_help = false;
        let mut show_version = false;
        let mut config_path: Option<PathBuf> = None;
        let mut mode: Option<String> = None;
        let mut words: Vec<&str> = Vec::new();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => show_help = true,
                "--version" | "-V" | "-v" => show_version = true,
                "--config" | "-c" => {
                    let value = iter.next().ok_or("--config requires a path")?;
                    config_path = Some(PathBuf::from(value));
                }
                "--mode" | "-m" => {
                    let value = iter.next().ok_or("--mode requires day or night")?;
                    mode = Some(value.clone());
                }
                other => {
                    if let Some(value) = other.strip_prefix("--config=") {
                        config_path = Some(PathBuf::from(value));
                    } else if let Some(value) = other.strip_prefix("--mode=") {
                        mode = Some(value.to_string());
                    } else if other.starts_with('-') {
                        return Err(format!("Unknown option: {other}"));
                    } else {
                        words.push(other);
                    }
                }
            }
        }

        if show_version {
            return Ok(CliAction::ShowVersion);
        }
        if show_help {
            return Ok(CliAction::ShowHelp);
        }

        let Some((&name, rest)) = words.split_first() else {
            return Ok(CliAction::ShowHelp);
        };

        let parse_mode = |mode: Option<String>| -> Result<Mode, String> {
            let value = mode.ok_or_else(|| format!("{name} requires --mode day|night"))?;
            value.parse().map_err(|e: crate::error::Error| e.to_string())
        };

        let command = match name {
            "schedule" => Command::Schedule,
            "clear" => Command::Clear,
            "list" => Command::List,
            "run-login-check" => Command::LoginCheck,
            APPLY_SUBCOMMAND => Command::Apply {
                mode: parse_mode(mode.take())?,
            },
            FADE_SUBCOMMAND => Command::Fade {
                mode: parse_mode(mode.take())?,
            },
            "help" => {
                return Ok(CliAction::Run {
                    command: Command::Help {
                        topic: rest.first().map(|topic| topic.to_string()),
                    },
                    debug_enabled,
                    config_path,
                });
            }
            unknown => return Err(format!("Unknown command: {unknown}")),
        };

        if let Some(extra) = rest.first() {
            return Err(format!("Unexpected argument for {name}: {extra}"));
        }
        if mode.is_some() {
            return Err(format!("{name} does not take --mode"));
        }

        Ok(CliAction::Run {
            command,
            debug_enabled,
            config_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        ParsedArgs::parse(std::iter::once("sundial").chain(args.iter().copied())).action
    }

    #[test]
    fn test_no_arguments_shows_help() {
        assert_eq!(parse(&[]), CliAction::ShowHelp);
    }

    #[test]
    fn test_version_and_help_take_precedence() {
        assert_eq!(parse(&["schedule", "--version"]), CliAction::ShowVersion);
        assert_eq!(parse(&["-h", "clear"]), CliAction::ShowHelp);
    }

    #[test]
    fn test_schedule_with_global_flags() {
        assert_eq!(
            parse(&["--config", "/tmp/s.toml", "schedule", "--debug"]),
            CliAction::Run {
                command: Command::Schedule,
                debug_enabled: true,
                config_path: Some(PathBuf::from("/tmp/s.toml")),
            }
        );
    }

    #[test]
    fn test_apply_and_fade_require_mode() {
        assert_eq!(
            parse(&[APPLY_SUBCOMMAND, "--mode", "night"]),
            CliAction::Run {
                command: Command::Apply { mode: Mode::Night },
                debug_enabled: false,
                config_path: None,
            }
        );
        assert_eq!(
            parse(&[FADE_SUBCOMMAND, "--mode=day"]),
            CliAction::Run {
                command: Command::Fade { mode: Mode::Day },
                debug_enabled: false,
                config_path: None,
            }
        );
        assert!(matches!(
            parse(&[FADE_SUBCOMMAND]),
            CliAction::ShowHelpDueToError(message) if message.contains("--mode")
        ));
        assert!(matches!(
            parse(&[APPLY_SUBCOMMAND, "--mode", "dusk"]),
            CliAction::ShowHelpDueToError(_)
        ));
    }

    #[test]
    fn test_invalid_input_reported() {
        assert!(matches!(
            parse(&["sunbathe"]),
            CliAction::ShowHelpDueToError(message) if message.contains("sunbathe")
        ));
        assert!(matches!(
            parse(&["list", "--verbose"]),
            CliAction::ShowHelpDueToError(_)
        ));
        assert!(matches!(
            parse(&["clear", "now"]),
            CliAction::ShowHelpDueToError(_)
        ));
        assert!(matches!(
            parse(&["schedule", "--mode", "day"]),
            CliAction::ShowHelpDueToError(_)
        ));
        assert!(matches!(
            parse(&["schedule", "--config"]),
            CliAction::ShowHelpDueToError(_)
        ));
    }

    #[test]
    fn test_help_topic() {
        assert_eq!(
            parse(&["help", "fade"]),
            CliAction::Run {
                command: Command::Help {
                    topic: Some("fade".to_string())
                },
                debug_enabled: false,
                config_path: None,
            }
        );
    }
}

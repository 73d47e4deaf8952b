//! Structured logging with box-drawing output.
//!
//! Every line goes to stdout. When a pass runs from an `at` job or a systemd
//! unit, stdout is the journal rather than a terminal, so colour codes are
//! stripped before writing.
//!
//! ## Conventions
//!
//! - **`log_version!`** opens a run: `┏ sundial vX.Y.Z ━━╸`.
//! - **`log_block_start!`** begins a conceptual block (`┃` spacer, then `┣ message`).
//! - **`log_decorated!`** continues a block: `┣ message`.
//! - **`log_indented!`** lists details under the preceding line: `┃   message`.
//! - **`log_pipe!`** inserts an empty `┃` spacer, typically before a semantic line.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_critical!`** print a `[LEVEL]` tag.
//! - **`log_debug!`** prints only when debug output was switched on with `--debug`.
//! - **`log_error_exit!`** closes a failed run with `┗[ERROR]`; **`log_end!`** closes a good one with `╹`.

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

pub struct Log;

impl Log {
    /// Enable or disable all output, e.g. to keep test output quiet.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        Self::is_enabled() && DEBUG_ENABLED.load(Ordering::SeqCst)
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Write one log line made of `lead` and `message`. Used by the macros.
pub fn emit(lead: &str, message: &str) {
    let line = format!("{lead}{message}\n");
    let mut stdout = std::io::stdout().lock();
    let _ = if stdout.is_terminal() {
        stdout.write_all(line.as_bytes())
    } else {
        stdout.write_all(strip_ansi_codes(&line).as_bytes())
    };
    let _ = stdout.flush();
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_emit {
    ($gate:expr, $lead:expr, $fmt:literal $($arg:tt)*) => {{
        if $gate {
            $crate::logger::emit($lead, &format!($fmt $($arg)*));
        }
    }};
    ($gate:expr, $lead:expr, $expr:expr) => {{
        if $gate {
            let expr = $expr;
            $crate::logger::emit($lead, &format!("{expr}"));
        }
    }};
}

/// Continue a block: `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($t:tt)*) => {
        $crate::__log_emit!($crate::logger::Log::is_enabled(), "┣ ", $($t)*)
    };
}

/// Detail line under the preceding message: `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($t:tt)*) => {
        $crate::__log_emit!($crate::logger::Log::is_enabled(), "┃   ", $($t)*)
    };
}

#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::__log_emit!($crate::logger::Log::is_enabled(), "┃", "")
    };
}

/// Start a new block with a spacer line above it.
#[macro_export]
macro_rules! log_block_start {
    ($($t:tt)*) => {
        $crate::__log_emit!($crate::logger::Log::is_enabled(), "┃\n┣ ", $($t)*)
    };
}

#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_emit!(
            $crate::logger::Log::is_enabled(),
            "┏ ",
            "{} v{} ━━╸",
            $crate::constants::APP_NAME,
            env!("CARGO_PKG_VERSION")
        )
    };
}

#[macro_export]
macro_rules! log_end {
    () => {
        $crate::__log_emit!($crate::logger::Log::is_enabled(), "╹", "")
    };
}

#[macro_export]
macro_rules! log_info {
    ($($t:tt)*) => {
        $crate::__log_emit!(
            $crate::logger::Log::is_enabled(),
            "┣[\x1b[32mINFO\x1b[0m] ",
            $($t)*
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($t:tt)*) => {
        $crate::__log_emit!(
            $crate::logger::Log::is_enabled(),
            "┣[\x1b[33mWARNING\x1b[0m] ",
            $($t)*
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)*) => {
        $crate::__log_emit!(
            $crate::logger::Log::is_enabled(),
            "┣[\x1b[31mERROR\x1b[0m] ",
            $($t)*
        )
    };
}

/// Terminal error line that closes the run.
#[macro_export]
macro_rules! log_error_exit {
    ($($t:tt)*) => {
        $crate::__log_emit!(
            $crate::logger::Log::is_enabled(),
            "┃\n┗[\x1b[31mERROR\x1b[0m] ",
            $($t)*
        )
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($t:tt)*) => {
        $crate::__log_emit!(
            $crate::logger::Log::is_enabled(),
            "┣[\x1b[31mCRITICAL\x1b[0m] ",
            $($t)*
        )
    };
}

/// Only printed when debug output is on.
#[macro_export]
macro_rules! log_debug {
    ($($t:tt)*) => {
        $crate::__log_emit!(
            $crate::logger::Log::is_debug(),
            "┣[\x1b[36mDEBUG\x1b[0m] ",
            $($t)*
        )
    };
}

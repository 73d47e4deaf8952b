//! Termination handling for long-running commands.
//!
//! A fade can run for minutes. SIGINT and SIGTERM clear a shared `running`
//! flag so the fade stops stepping and still lands on its target.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

/// Register the handlers and return the flag they clear.
pub fn install_termination_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to register signal handlers")?;

    let running_clone = running.clone();
    thread::spawn(move || {
        for sig in signals.forever() {
            log_debug!("Received signal {sig}");
            if running_clone.swap(false, Ordering::SeqCst) {
                log_pipe!();
                log_warning!("Stopping, finishing on the target values");
            }
        }
    });

    Ok(running)
}

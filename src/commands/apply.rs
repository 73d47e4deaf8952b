//! `internal-apply --mode <mode>`: fired by a queued job at event time.

use anyhow::{Context, Result};

use super::CommandContext;
use crate::desktop::xsct::XsctGateway;
use crate::desktop::{ModeApplier, ScreenProfileApplier};
use crate::mode::Mode;

pub fn run(applier: &dyn ModeApplier, mode: Mode) -> Result<()> {
    applier
        .apply_mode(mode)
        .with_context(|| format!("Failed to apply {mode} mode"))
}

pub fn handle_apply_command(context: &CommandContext, mode: Mode) -> Result<()> {
    log_version!();
    log_block_start!("Applying {mode} mode");

    let gateway = XsctGateway::new(context.runner);
    let applier = ScreenProfileApplier::new(
        &gateway,
        context.config.day,
        context.config.night,
        context.config.brightness_range,
    );
    run(&applier, mode)?;

    log_end!();
    Ok(())
}

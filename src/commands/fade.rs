//! `fade --mode <mode>`: fired by a fade timer ahead of an event.

use anyhow::Result;
use std::sync::atomic::AtomicBool;

use super::CommandContext;
use crate::desktop::DesktopStateGateway;
use crate::desktop::xsct::XsctGateway;
use crate::mode::Mode;
use crate::signals::install_termination_flag;
use crate::transition::{TransitionOrchestrator, TransitionReport};

pub fn run(
    context: &CommandContext,
    gateway: &dyn DesktopStateGateway,
    mode: Mode,
    running: &AtomicBool,
) -> Result<TransitionReport> {
    let config = context.config;
    let orchestrator = TransitionOrchestrator::new(gateway, context.clock, config.brightness_range);
    Ok(orchestrator.run(
        mode,
        config.profile(mode),
        config.transition.fade_duration,
        config.transition.step_interval,
        running,
    )?)
}

pub fn handle_fade_command(context: &CommandContext, mode: Mode) -> Result<()> {
    log_version!();

    let running = install_termination_flag()?;
    let gateway = XsctGateway::new(context.runner);
    let report = run(context, &gateway, mode, &running)?;

    if report.steps_failed > 0 {
        log_pipe!();
        log_warning!(
            "{} of {} fade steps failed",
            report.steps_failed,
            report.steps_total
        );
    }
    log_end!();
    Ok(())
}

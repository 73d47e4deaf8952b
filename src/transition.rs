//! Gradual fade of the screen from its live state to a mode's profile.
//!
//! The fade is split into `floor(duration / step_interval)` equal linear
//! steps. Step `i` is applied at `start + i * step_interval` measured from a
//! single monotonic reference, so slow apply calls do not push later steps
//! back. A failed step is logged and the fade moves on. Whatever happens in
//! the loop, including an interrupt, the exact target is applied once at the
//! end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::constants::{FALLBACK_BRIGHTNESS, FALLBACK_TEMP};
use crate::desktop::{DesktopStateGateway, ScreenProfile};
use crate::error::{Error, Result};
use crate::mode::Mode;
use crate::time_source::Clock;

/// Parameters of one fade, fixed before the first step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRun {
    pub mode: Mode,
    pub start: ScreenProfile,
    pub target: ScreenProfile,
    pub duration: Duration,
    pub step_interval: Duration,
    pub steps_total: u32,
}

impl TransitionRun {
    /// Value for step `i` (1-based) before clamping.
    fn interpolate(&self, step: u32) -> (f64, f64) {
        let steps = f64::from(self.steps_total);
        let progress = f64::from(step);
        let start_temp = f64::from(self.start.temperature_k);
        let temp_delta = (f64::from(self.target.temperature_k) - start_temp) / steps;
        let brightness_delta = (self.target.brightness - self.start.brightness) / steps;
        (
            start_temp + temp_delta * progress,
            self.start.brightness + brightness_delta * progress,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionReport {
    pub steps_total: u32,
    pub steps_applied: u32,
    pub steps_failed: u32,
    pub interrupted: bool,
}

pub struct TransitionOrchestrator<'a> {
    gateway: &'a dyn DesktopStateGateway,
    clock: &'a dyn Clock,
    brightness_range: (f64, f64),
}

impl<'a> TransitionOrchestrator<'a> {
    pub fn new(
        gateway: &'a dyn DesktopStateGateway,
        clock: &'a dyn Clock,
        brightness_range: (f64, f64),
    ) -> Self {
        Self {
            gateway,
            clock,
            brightness_range,
        }
    }

    /// Read the live state, substituting defaults for anything unreadable.
    fn start_state(&self) -> ScreenProfile {
        let reading = match self.gateway.get_state() {
            Ok(reading) => reading,
            Err(e) => {
                log_warning!("Could not read the current screen state: {e}");
                Default::default()
            }
        };

        ScreenProfile {
            temperature_k: reading.temperature_k.unwrap_or(FALLBACK_TEMP),
            brightness: reading.brightness.unwrap_or(FALLBACK_BRIGHTNESS),
        }
    }

    pub fn plan(
        &self,
        mode: Mode,
        target: ScreenProfile,
        duration: Duration,
        step_interval: Duration,
    ) -> Result<TransitionRun> {
        if step_interval.is_zero() {
            return Err(Error::validation("step interval must be greater than zero"));
        }
        let steps = duration.as_nanos() / step_interval.as_nanos();

        Ok(TransitionRun {
            mode,
            start: self.start_state(),
            target,
            duration,
            step_interval,
            steps_total: u32::try_from(steps).unwrap_or(u32::MAX),
        })
    }

    /// Fade to `target` over `duration`. Stops stepping once `running` is
    /// cleared, but still applies the target before returning.
    pub fn run(
        &self,
        mode: Mode,
        target: ScreenProfile,
        duration: Duration,
        step_interval: Duration,
        running: &AtomicBool,
    ) -> Result<TransitionReport> {
        let run = self.plan(mode, target, duration, step_interval)?;
        let mut report = TransitionReport {
            steps_total: run.steps_total,
            ..TransitionReport::default()
        };

        if run.steps_total < 1 {
            log_debug!("Fade shorter than one step, applying {mode} directly");
            self.apply_final(&run)?;
            return Ok(report);
        }

        log_block_start!(
            "Fading to {mode}: {}K/{:.2} → {}K/{:.2} over {}s in {} steps",
            run.start.temperature_k,
            run.start.brightness,
            run.target.temperature_k,
            run.target.brightness,
            run.duration.as_secs(),
            run.steps_total
        );

        let origin = self.clock.monotonic();
        for step in 1..=run.steps_total {
            self.clock
                .sleep_until(origin + run.step_interval * step, running);
            if !running.load(Ordering::SeqCst) {
                report.interrupted = true;
                log_warning!("Fade interrupted after {} of {} steps", step - 1, run.steps_total);
                break;
            }

            let (temperature, brightness) = run.interpolate(step);
            let value = ScreenProfile::clamped(temperature, brightness, self.brightness_range);
            match self.gateway.apply_state(value.temperature_k, value.brightness) {
                Ok(()) => report.steps_applied += 1,
                Err(e) => {
                    report.steps_failed += 1;
                    log_warning!("Step {step} failed: {e}");
                }
            }
        }

        self.apply_final(&run)?;

        if report.steps_failed > 0 {
            log_decorated!(
                "Fade finished with {} of {} steps failed",
                report.steps_failed,
                run.steps_total
            );
        } else {
            log_decorated!("Fade to {mode} complete");
        }
        Ok(report)
    }

    fn apply_final(&self, run: &TransitionRun) -> Result<()> {
        let value = ScreenProfile::clamped(
            f64::from(run.target.temperature_k),
            run.target.brightness,
            self.brightness_range,
        );
        self.gateway.apply_state(value.temperature_k, value.brightness)?;
        Ok(())
    }
}

//! `run-login-check`: apply whichever mode the sun says is current.

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::CommandContext;
use crate::config::Config;
use crate::desktop::xsct::XsctGateway;
use crate::desktop::{ModeApplier, ScreenProfileApplier};
use crate::geo::current_mode;
use crate::mode::Mode;

pub fn run(config: &Config, applier: &dyn ModeApplier, now: DateTime<Utc>) -> Result<Mode> {
    let mode = current_mode(&config.location, config.timezone, now);
    log_decorated!("Current period: {mode}");
    super::apply::run(applier, mode)?;
    Ok(mode)
}

pub fn handle_login_check_command(context: &CommandContext) -> Result<()> {
    log_version!();
    log_block_start!("Checking the current period");

    let gateway = XsctGateway::new(context.runner);
    let applier = ScreenProfileApplier::new(
        &gateway,
        context.config.day,
        context.config.night,
        context.config.brightness_range,
    );
    run(context.config, &applier, context.clock.now())?;

    log_end!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::toronto_config;
    use super::*;
    use crate::desktop::ApplyError;
    use chrono::TimeZone;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Mode>>);

    impl ModeApplier for Recorder {
        fn apply_mode(&self, mode: Mode) -> std::result::Result<(), ApplyError> {
            self.0.borrow_mut().push(mode);
            Ok(())
        }
    }

    #[test]
    fn test_midday_applies_day() {
        let applier = Recorder::default();
        let noon = Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap();

        let mode = run(&toronto_config(), &applier, noon).unwrap();

        assert_eq!(mode, Mode::Day);
        assert_eq!(*applier.0.borrow(), vec![Mode::Day]);
    }

    #[test]
    fn test_after_sunset_applies_night() {
        let applier = Recorder::default();
        // 23:30 Toronto time.
        let late = Utc.with_ymd_and_hms(2024, 6, 22, 3, 30, 0).unwrap();

        assert_eq!(run(&toronto_config(), &applier, late).unwrap(), Mode::Night);
    }
}

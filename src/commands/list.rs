//! `list`: show the jobs and fade timers currently scheduled.

use anyhow::Result;

use super::CommandContext;
use crate::scheduler::at_queue::{AtQueueScheduler, TaggedJob};
use crate::scheduler::timers::InstalledTimer;

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub jobs: Vec<TaggedJob>,
    pub timers: Vec<InstalledTimer>,
}

pub fn run(context: &CommandContext) -> Result<Listing> {
    let timers = context.timers();
    let scheduler = AtQueueScheduler::new(context.runner, context.environment, Some(&timers))?;
    Ok(Listing {
        jobs: scheduler.list_tagged()?,
        timers: timers.installed(),
    })
}

pub fn handle_list_command(context: &CommandContext) -> Result<()> {
    log_version!();
    let listing = run(context)?;

    if listing.jobs.is_empty() {
        log_block_start!("No scheduled jobs");
    } else {
        log_block_start!("Scheduled jobs:");
        for job in &listing.jobs {
            log_indented!("{:>4}  {:<7} {}", job.id, job.mode_label(), job.time);
        }
    }

    if listing.timers.is_empty() {
        log_block_start!("No fade timers installed");
    } else {
        log_block_start!("Fade timers:");
        for timer in &listing.timers {
            log_indented!(
                "{:<5} {}",
                timer.mode,
                timer.on_calendar.as_deref().unwrap_or("(no OnCalendar line)")
            );
        }
    }

    log_end!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, toronto_config};
    use super::*;
    use crate::mode::Mode;
    use crate::testing::{FakeRunner, ManualClock};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_list_shows_scheduled_state() {
        let dir = tempdir().unwrap();
        let config = toronto_config();
        let runner = FakeRunner::new().with_job("Sat Jun 22 09:00:00 2024", "backup.sh\n");
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());
        let ctx = context(&config, &runner, &clock, dir.path());

        let report = super::super::schedule::run(&ctx).unwrap();
        let listing = run(&ctx).unwrap();

        assert_eq!(listing.jobs.len(), report.events.len());
        assert_eq!(listing.jobs[0].mode, Some(Mode::Night));
        assert_eq!(listing.timers.len(), 2);
        assert!(
            listing
                .timers
                .iter()
                .all(|timer| timer.on_calendar.as_deref().is_some_and(|c| c.ends_with("UTC")))
        );
    }
}

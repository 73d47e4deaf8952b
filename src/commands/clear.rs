//! `clear`: remove every job this application queued and both fade timers.

use anyhow::Result;

use super::CommandContext;
use crate::scheduler::at_queue::{AtQueueScheduler, ClearOutcome};

/// Clear both substrates. The timers are removed even when the job queue is
/// unreachable.
pub fn run(context: &CommandContext) -> ClearOutcome {
    let timers = context.timers();
    match AtQueueScheduler::new(context.runner, context.environment, Some(&timers)) {
        Ok(scheduler) => scheduler.clear(),
        Err(e) => {
            log_warning!("Job queue unavailable: {e}");
            timers.disable_all();
            ClearOutcome {
                listing_failed: true,
                ..ClearOutcome::default()
            }
        }
    }
}

pub fn handle_clear_command(context: &CommandContext) -> Result<()> {
    log_version!();
    log_block_start!("Clearing scheduled events");

    let outcome = run(context);
    log_decorated!("Removed {} job(s)", outcome.removed);

    if !outcome.success() {
        anyhow::bail!(
            "clear finished with {} removal failure(s){}",
            outcome.failed,
            if outcome.listing_failed {
                " and an unreadable job queue"
            } else {
                ""
            }
        );
    }

    log_end!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, toronto_config};
    use super::*;
    use crate::constants::JOB_MARKER;
    use crate::testing::{FakeRunner, ManualClock};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_clear_after_schedule_leaves_nothing() {
        let dir = tempdir().unwrap();
        let config = toronto_config();
        let runner = FakeRunner::new().with_job("Sat Jun 22 09:00:00 2024", "backup.sh\n");
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());
        let ctx = context(&config, &runner, &clock, dir.path());

        super::super::schedule::run(&ctx).unwrap();
        let outcome = run(&ctx);

        assert!(outcome.success());
        assert!(outcome.removed > 0);
        let remaining = runner.jobs();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].body.contains(JOB_MARKER));
        assert!(!dir.path().join("sundial-fade@day.timer").exists());
        assert!(!dir.path().join("sundial-fade@night.timer").exists());
    }

    #[test]
    fn test_clear_without_at_still_removes_timers() {
        let dir = tempdir().unwrap();
        let config = toronto_config();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());

        let runner = FakeRunner::new();
        super::super::schedule::run(&context(&config, &runner, &clock, dir.path())).unwrap();
        assert!(dir.path().join("sundial-fade@night.timer").exists());

        let broken = FakeRunner::new().without_program("atq");
        let outcome = run(&context(&config, &broken, &clock, dir.path()));

        assert!(!outcome.success());
        assert!(!dir.path().join("sundial-fade@night.timer").exists());
    }
}

//! `schedule`: plan the event window once and hand it to both substrates.
//!
//! The queued jobs switch modes at each event. The fade timers start a
//! gradual transition ahead of the next sunrise and the next sunset, and are
//! removed when fades are disabled.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use super::CommandContext;
use crate::config::TransitionSettings;
use crate::geo::SolarEvent;
use crate::geo::planner::EventWindowPlanner;
use crate::mode::Mode;
use crate::scheduler::at_queue::{AtQueueScheduler, ScheduleOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    pub events: Vec<SolarEvent>,
    pub outcome: ScheduleOutcome,
    /// Fade start per mode; empty when fades are off.
    pub fades: Vec<(Mode, DateTime<Utc>)>,
}

/// First fade start per mode that still lies in the future.
///
/// A fade ends `fade_offset_minutes` after its event, so it starts at
/// `event + offset - duration`. When that is already past for the nearest
/// event of a mode, the next event of the same mode is used.
pub fn fade_starts(
    events: &[SolarEvent],
    settings: &TransitionSettings,
    now: DateTime<Utc>,
) -> Vec<(Mode, DateTime<Utc>)> {
    let lead = ChronoDuration::minutes(i64::from(settings.fade_offset_minutes))
        - ChronoDuration::from_std(settings.fade_duration).unwrap_or(ChronoDuration::zero());

    Mode::ALL
        .into_iter()
        .filter_map(|mode| {
            events
                .iter()
                .filter(|event| event.mode() == mode)
                .map(|event| event.utc() + lead)
                .find(|start| *start > now)
                .map(|start| (mode, start))
        })
        .collect()
}

pub fn run(context: &CommandContext) -> Result<ScheduleReport> {
    let config = context.config;
    let now = context.clock.now();

    let planner = EventWindowPlanner::new(config.location, config.timezone, config.horizon_days)?;
    let events = planner.plan(now);
    log_decorated!(
        "Planned {} event(s) over {} day(s)",
        events.len(),
        config.horizon_days
    );

    let timers = context.timers();
    let scheduler = AtQueueScheduler::new(context.runner, context.environment, Some(&timers))?;
    let outcome = scheduler.schedule(&events, &context.invocation)?;

    let fades = if config.transition.fades_active() {
        let fades = fade_starts(&events, &config.transition, now);
        if let Err(e) = timers.write_batch(&fades) {
            log_warning!("Fade timers could not be installed, withdrawing the queued jobs");
            let cleanup = scheduler.clear();
            if !cleanup.success() {
                log_warning!(
                    "{} queued job(s) could not be withdrawn; run `sundial clear`",
                    cleanup.failed
                );
            }
            return Err(e.into());
        }
        for mode in Mode::ALL {
            if !fades.iter().any(|(scheduled, _)| *scheduled == mode) {
                log_debug!("No upcoming {mode} fade inside the horizon");
                timers.remove(mode);
            }
        }
        fades
    } else {
        timers.disable_all();
        Vec::new()
    };

    Ok(ScheduleReport {
        events,
        outcome,
        fades,
    })
}

pub fn handle_schedule_command(context: &CommandContext) -> Result<()> {
    log_version!();
    log_block_start!("Scheduling solar events");

    let report = run(context)?;

    log_block_start!("Queued {} job(s)", report.outcome.submitted.len());
    for job in &report.outcome.submitted {
        log_indented!(
            "{:<5} {} (job {})",
            job.mode,
            job.at_time,
            job.id.as_deref().unwrap_or("?")
        );
    }
    if report.outcome.failed > 0 {
        log_pipe!();
        log_warning!("{} job(s) could not be queued", report.outcome.failed);
    }

    if !report.fades.is_empty() {
        log_block_start!("Fade timers");
        for (mode, start) in &report.fades {
            log_indented!(
                "{:<5} fade starts {}",
                mode,
                start
                    .with_timezone(&context.config.timezone)
                    .format("%Y-%m-%d %H:%M:%S %Z")
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
    use crate::geo::SolarEventKind;
    use crate::testing::{FakeRunner, ManualClock};
    use chrono::TimeZone;
    use chrono_tz::America::Toronto;
    use std::time::Duration;
    use tempfile::tempdir;

    fn settings(duration_minutes: u64, offset_minutes: i32) -> TransitionSettings {
        TransitionSettings {
            enabled: true,
            fade_duration: Duration::from_secs(duration_minutes * 60),
            fade_offset_minutes: offset_minutes,
            step_interval: Duration::from_secs(2),
        }
    }

    fn event(kind: SolarEventKind, y: i32, m: u32, d: u32, h: u32, min: u32) -> SolarEvent {
        SolarEvent {
            instant: Toronto.with_ymd_and_hms(y, m, d, h, min, 0).unwrap(),
            kind,
        }
    }

    #[test]
    fn test_fade_starts_before_event() {
        let events = vec![
            event(SolarEventKind::Sunset, 2024, 6, 21, 21, 3),
            event(SolarEventKind::Sunrise, 2024, 6, 22, 5, 36),
        ];
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap();

        let starts = fade_starts(&events, &settings(15, 0), now);

        assert_eq!(
            starts,
            vec![
                (Mode::Day, Utc.with_ymd_and_hms(2024, 6, 22, 9, 21, 0).unwrap()),
                (Mode::Night, Utc.with_ymd_and_hms(2024, 6, 22, 0, 48, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn test_past_fade_moves_to_next_event_of_same_mode() {
        let events = vec![
            event(SolarEventKind::Sunset, 2024, 6, 21, 21, 3),
            event(SolarEventKind::Sunrise, 2024, 6, 22, 5, 36),
            event(SolarEventKind::Sunset, 2024, 6, 22, 21, 3),
        ];
        // 20:55 local: today's sunset fade already began at 20:48.
        let now = Utc.with_ymd_and_hms(2024, 6, 22, 0, 55, 0).unwrap();

        let starts = fade_starts(&events, &settings(15, 0), now);
        let night = starts.iter().find(|(mode, _)| *mode == Mode::Night).unwrap();

        assert_eq!(night.1, Utc.with_ymd_and_hms(2024, 6, 23, 0, 48, 0).unwrap());
    }

    #[test]
    fn test_offset_shifts_fade_end() {
        let events = vec![event(SolarEventKind::Sunset, 2024, 6, 21, 21, 0)];
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();

        let starts = fade_starts(&events, &settings(30, 10), now);

        // Ends at 21:10 local, starts at 20:40 local.
        assert_eq!(
            starts,
            vec![(Mode::Night, Utc.with_ymd_and_hms(2024, 6, 22, 0, 40, 0).unwrap())]
        );
    }

    #[test]
    fn test_schedule_queues_jobs_and_writes_timers() {
        let dir = tempdir().unwrap();
        let config = toronto_config();
        let runner = FakeRunner::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());
        let ctx = context(&config, &runner, &clock, dir.path());

        let report = run(&ctx).unwrap();

        assert_eq!(report.outcome.submitted.len(), report.events.len());
        assert_eq!(runner.jobs().len(), report.events.len());
        assert_eq!(report.fades.len(), 2);
        assert!(dir.path().join("sundial-fade@day.timer").exists());
        assert!(dir.path().join("sundial-fade@night.timer").exists());
        assert!(dir.path().join("sundial-fade@.service").exists());
    }

    #[test]
    fn test_schedule_twice_replaces_jobs_and_keeps_timers() {
        let dir = tempdir().unwrap();
        let config = toronto_config();
        let runner = FakeRunner::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());
        let ctx = context(&config, &runner, &clock, dir.path());

        let first = run(&ctx).unwrap();
        let reloads = runner.count_calls("daemon-reload");
        let second = run(&ctx).unwrap();

        assert_eq!(runner.jobs().len(), second.events.len());
        assert_eq!(first.fades, second.fades);
        assert_eq!(runner.count_calls("daemon-reload"), reloads);
    }

    #[test]
    fn test_disabled_fades_remove_timers() {
        let dir = tempdir().unwrap();
        let mut config = toronto_config();
        let runner = FakeRunner::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());

        run(&context(&config, &runner, &clock, dir.path())).unwrap();
        config.transition.enabled = false;
        let report = run(&context(&config, &runner, &clock, dir.path())).unwrap();

        assert!(report.fades.is_empty());
        assert!(!dir.path().join("sundial-fade@day.timer").exists());
        assert!(!dir.path().join("sundial-fade@night.timer").exists());
    }

    #[test]
    fn test_failed_timer_install_withdraws_queued_jobs() {
        let dir = tempdir().unwrap();
        let config = toronto_config();
        let runner = FakeRunner::new()
            .with_job("Sat Jun 22 03:00:00 2024", "#!/bin/sh\nlogrotate\n")
            .failing_on("systemctl", "enable");
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());

        let err = run(&context(&config, &runner, &clock, dir.path())).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::error::Error>(),
            Some(crate::error::Error::Scheduler { .. })
        ));
        assert_eq!(runner.jobs().len(), 1);
        assert!(runner.count_calls("atrm") > 0);
        assert!(!dir.path().join("sundial-fade@day.timer").exists());
        assert!(!dir.path().join("sundial-fade@night.timer").exists());
    }

    #[test]
    fn test_missing_at_daemon_fails_before_queueing() {
        let dir = tempdir().unwrap();
        let config = toronto_config();
        let runner = FakeRunner::new().with_at_daemon_active(false);
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap());

        let err = run(&context(&config, &runner, &clock, dir.path())).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::error::Error>(),
            Some(crate::error::Error::Dependency(_))
        ));
        assert!(runner.jobs().is_empty());
    }
}

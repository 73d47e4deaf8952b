use chrono::{Duration, TimeZone, Utc};
use std::fs;
use sundial::constants::JOB_MARKER;
use sundial::geo::planner::plan;
use sundial::mode::Mode;
use sundial::scheduler::Invocation;
use sundial::scheduler::at_queue::AtQueueScheduler;
use sundial::scheduler::environment::ServiceManagerEnvironment;
use sundial::scheduler::timers::DynamicTimerManager;
use sundial::testing::FakeRunner;
use tempfile::tempdir;

const ENVIRONMENT: ServiceManagerEnvironment = ServiceManagerEnvironment::systemctl_only();

#[test]
fn test_schedule_then_clear_leaves_no_tagged_jobs() {
    let runner = FakeRunner::new()
        .with_job("Sat Jun 22 03:00:00 2024", "#!/bin/sh\nlogrotate\n")
        .with_job("Sun Jun 23 03:00:00 2024", "#!/bin/sh\nbackup --mode day\n");
    let now = Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap();
    let events = plan(43.65, -79.38, "America/Toronto", 3, now).unwrap();
    let invocation = Invocation::new("/usr/local/bin/sundial");

    let scheduler = AtQueueScheduler::new(&runner, &ENVIRONMENT, None).unwrap();
    let outcome = scheduler.schedule(&events, &invocation).unwrap();

    assert_eq!(outcome.submitted.len(), events.len());
    assert_eq!(scheduler.list_tagged().unwrap().len(), events.len());
    let first_body = &runner.jobs()[2].body;
    assert!(first_body.contains("export DISPLAY=':0'"));
    assert!(first_body.contains("'internal-apply' '--mode' 'night'"));
    assert!(first_body.trim_end().ends_with(JOB_MARKER));

    let cleared = scheduler.clear();

    assert!(cleared.success());
    assert_eq!(cleared.removed, events.len());
    assert!(scheduler.list_tagged().unwrap().is_empty());
    assert_eq!(runner.jobs().len(), 2);
}

#[test]
fn test_rescheduling_replaces_previous_jobs() {
    let runner = FakeRunner::new();
    let invocation = Invocation::new("/usr/local/bin/sundial");
    let scheduler = AtQueueScheduler::new(&runner, &ENVIRONMENT, None).unwrap();

    let monday = Utc.with_ymd_and_hms(2024, 6, 17, 16, 0, 0).unwrap();
    let tuesday = monday + Duration::days(1);

    let first = plan(43.65, -79.38, "America/Toronto", 2, monday).unwrap();
    scheduler.schedule(&first, &invocation).unwrap();
    let second = plan(43.65, -79.38, "America/Toronto", 2, tuesday).unwrap();
    scheduler.schedule(&second, &invocation).unwrap();

    assert_eq!(scheduler.list_tagged().unwrap().len(), second.len());
}

#[test]
fn test_timer_rewrite_is_idempotent() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::new();
    let timers = DynamicTimerManager::new(
        &runner,
        dir.path().to_path_buf(),
        Invocation::new("/usr/local/bin/sundial"),
    );
    let start = Utc.with_ymd_and_hms(2024, 6, 22, 0, 48, 0).unwrap();

    assert!(timers.write(Mode::Night, start).unwrap());
    let content = fs::read_to_string(dir.path().join("sundial-fade@night.timer")).unwrap();
    let reloads = runner.count_calls("daemon-reload");

    assert!(!timers.write(Mode::Night, start).unwrap());
    assert_eq!(runner.count_calls("daemon-reload"), reloads);
    assert_eq!(
        fs::read_to_string(dir.path().join("sundial-fade@night.timer")).unwrap(),
        content
    );
    assert!(content.contains("OnCalendar=2024-06-22 00:48:00 UTC"));

    assert!(timers.write(Mode::Night, start + Duration::days(1)).unwrap());
    assert_eq!(runner.count_calls("daemon-reload"), reloads + 1);
}

#[test]
fn test_clear_removes_timers_through_scheduler() {
    let dir = tempdir().unwrap();
    let runner = FakeRunner::new();
    let timers = DynamicTimerManager::new(
        &runner,
        dir.path().to_path_buf(),
        Invocation::new("/usr/local/bin/sundial"),
    );
    let start = Utc.with_ymd_and_hms(2024, 6, 22, 9, 21, 0).unwrap();
    timers
        .write_batch(&[(Mode::Day, start), (Mode::Night, start + Duration::hours(15))])
        .unwrap();
    assert_eq!(timers.installed().len(), 2);

    let scheduler = AtQueueScheduler::new(&runner, &ENVIRONMENT, Some(&timers)).unwrap();
    scheduler.clear();

    assert!(timers.installed().is_empty());
    assert!(dir.path().join("sundial-fade@.service").exists());
}

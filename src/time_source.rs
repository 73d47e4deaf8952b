//! Clock abstraction for the wall clock and the fade's monotonic ticks.
//!
//! The planner needs "now" as an absolute instant; the fade loop needs a
//! monotonic reference and an interruptible sleep. Both go through [`Clock`]
//! so tests can drive hundreds of fade steps without waiting for them.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep chunk, so a termination request is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Current monotonic reading.
    fn monotonic(&self) -> Instant;

    /// Block until `deadline`, returning early once `running` turns false.
    fn sleep_until(&self, deadline: Instant, running: &AtomicBool);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

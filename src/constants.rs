//! Application-wide constants: names, bounds, and defaults.
//!
//! Anything that appears in more than one module (unit names, the job marker,
//! hardware-safe ranges) lives here so the scheduling substrates and the
//! configuration layer agree on the same values.

// # Identity

pub const APP_NAME: &str = "sundial";

/// Comment appended to every queued job body so later passes can recognise
/// their own jobs among unrelated ones.
pub const JOB_MARKER: &str = "# sundial-scheduled-job";

/// Subcommand fired by queued jobs at event time.
pub const APPLY_SUBCOMMAND: &str = "internal-apply";

/// Subcommand fired by the fade timers.
pub const FADE_SUBCOMMAND: &str = "fade";

// # Systemd units

pub const FADE_TIMER_PREFIX: &str = "sundial-fade@";
pub const FADE_SERVICE_TEMPLATE: &str = "sundial-fade@.service";

/// Required binaries for the job queue path.
pub const AT_BINARIES: &[&str] = &["at", "atq", "atrm"];
pub const SYSTEMCTL: &str = "systemctl";
pub const AT_DAEMON_UNIT: &str = "atd";

/// Variables a queued job needs to reach the graphical session.
pub const SESSION_ENV_VARS: &[&str] = &[
    "DISPLAY",
    "XAUTHORITY",
    "WAYLAND_DISPLAY",
    "DBUS_SESSION_BUS_ADDRESS",
    "XDG_RUNTIME_DIR",
];

/// At least one of these must be captured for a job to be useful.
pub const REQUIRED_SESSION_VARS: &[&str] = &["DISPLAY", "XAUTHORITY"];

// # Solar geometry

/// Zenith of the sun's upper limb at apparent sunrise, refraction included.
pub const SUNRISE_ZENITH_DEG: f64 = 90.833;

pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

// # Screen bounds

pub const MINIMUM_TEMP: u32 = 1000;
pub const MAXIMUM_TEMP: u32 = 10000;
pub const MINIMUM_BRIGHTNESS: f64 = 0.1;
pub const MAXIMUM_BRIGHTNESS: f64 = 2.0;

/// Used by the fade when the live state cannot be read.
pub const FALLBACK_TEMP: u32 = 6500;
pub const FALLBACK_BRIGHTNESS: f64 = 1.0;

// # Defaults

pub const DEFAULT_LATITUDE: f64 = 43.65;
pub const DEFAULT_LONGITUDE: f64 = -79.38;
pub const DEFAULT_TIMEZONE: &str = "America/Toronto";

pub const DEFAULT_HORIZON_DAYS: u32 = 2;
pub const MINIMUM_HORIZON_DAYS: u32 = 1;
pub const MAXIMUM_HORIZON_DAYS: u32 = 31;

pub const DEFAULT_TRANSITIONS_ENABLED: bool = true;
pub const DEFAULT_FADE_DURATION_MINUTES: u32 = 15;
pub const MAXIMUM_FADE_DURATION_MINUTES: u32 = 240;
pub const DEFAULT_FADE_OFFSET_MINUTES: i32 = 0;
/// Half a day either side of the event.
pub const MAXIMUM_FADE_OFFSET_MINUTES: i32 = 720;
pub const DEFAULT_STEP_INTERVAL_SECONDS: u32 = 2;
pub const MINIMUM_STEP_INTERVAL_SECONDS: u32 = 1;
pub const MAXIMUM_STEP_INTERVAL_SECONDS: u32 = 600;

pub const DEFAULT_DAY_TEMP: u32 = 6500;
pub const DEFAULT_DAY_BRIGHTNESS: f64 = 1.0;
pub const DEFAULT_NIGHT_TEMP: u32 = 4500;
pub const DEFAULT_NIGHT_BRIGHTNESS: f64 = 0.85;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

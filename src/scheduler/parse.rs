//! Parsers for the text printed by the `at` tools.
//!
//! Each parser takes the raw output and returns a typed value or `None`, so
//! callers decide what an unrecognised line means.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{APPLY_SUBCOMMAND, JOB_MARKER};
use crate::mode::Mode;

/// `12\tFri Jun 21 21:02:00 2024 a user`
static ATQ_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)\s+(\w{3}\s+\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+\d{4})")
        .expect("atq regex is valid")
});

/// `job 7 at Fri Jun 21 21:02:00 2024`, printed by `at` on stderr.
static SUBMITTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"job\s+(\S+)\s+at\s").expect("submission regex is valid"));

static MODE_ARG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--mode'?(?:\s+|=)'?([A-Za-z]+)").expect("mode regex is valid"));

/// One line of `atq` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: String,
    pub time: String,
}

/// Parse one `atq` line. A line with an id but an unfamiliar date layout
/// keeps the remaining text as the time; a blank line yields `None`.
pub fn parse_atq_line(line: &str) -> Option<QueueEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(captures) = ATQ_LINE_RE.captures(line) {
        return Some(QueueEntry {
            id: captures[1].to_string(),
            time: captures[2].split_whitespace().collect::<Vec<_>>().join(" "),
        });
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let id = parts.next()?.to_string();
    let time = parts.next().unwrap_or("").trim().to_string();
    Some(QueueEntry { id, time })
}

pub fn parse_atq_output(output: &str) -> Vec<QueueEntry> {
    output.lines().filter_map(parse_atq_line).collect()
}

/// Whether a job body was written by this application.
pub fn is_tagged(body: &str) -> bool {
    body.lines().any(|line| line.trim() == JOB_MARKER)
}

/// Mode passed to the apply command inside a job body, `None` if absent or
/// not a known mode.
pub fn parse_job_mode(body: &str) -> Option<Mode> {
    body.lines()
        .filter(|line| line.contains(APPLY_SUBCOMMAND))
        .find_map(|line| MODE_ARG_RE.captures(line))
        .and_then(|captures| captures[1].parse().ok())
}

/// Job id reported by `at` after a submission.
pub fn parse_submitted_job_id(stderr: &str) -> Option<String> {
    SUBMITTED_RE
        .captures(stderr)
        .map(|captures| captures[1].to_string())
}

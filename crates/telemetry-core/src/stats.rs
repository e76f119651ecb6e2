//! Derived per-device statistics.
//!
//! Both computations are pure functions over the raw sample sequences, so the
//! same input always yields the same output regardless of how many readers
//! are computing it concurrently.

use chrono::{DateTime, TimeDelta, Utc};

const NANOS_PER_MINUTE: f64 = 60_000_000_000.0;

/// Heartbeat density over the observed span, scaled to a percentage.
///
/// `count / span_minutes * 100`, where the span runs from the earliest to the
/// latest heartbeat. Heartbeats are not assumed to be sorted. Zero or one
/// heartbeat, or a zero-length span, yields `0.0`.
///
/// This is not a true availability figure: frequent heartbeats over a short
/// span push the result above 100, and it is reported unclamped.
pub fn uptime_percent(heartbeats: &[DateTime<Utc>]) -> f64 {
    let Some((&first, rest)) = heartbeats.split_first() else {
        return 0.0;
    };

    let (earliest, latest) = rest
        .iter()
        .fold((first, first), |(lo, hi), &hb| (lo.min(hb), hi.max(hb)));

    let span = span_minutes(latest - earliest);
    if span <= 0.0 {
        return 0.0;
    }

    heartbeats.len() as f64 / span * 100.0
}

/// Mean upload time in whole units, truncated toward zero. Empty input yields 0.
pub fn average_upload_time(samples: &[i64]) -> i64 {
    if samples.is_empty() {
        return 0;
    }
    let sum: i128 = samples.iter().map(|&s| i128::from(s)).sum();
    // The mean of i64 values always fits back into an i64.
    (sum / samples.len() as i128) as i64
}

fn span_minutes(delta: TimeDelta) -> f64 {
    let whole = delta.num_seconds() as f64 / 60.0;
    whole + f64::from(delta.subsec_nanos()) / NANOS_PER_MINUTE
}

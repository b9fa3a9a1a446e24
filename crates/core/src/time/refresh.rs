use chrono::{DateTime, Utc};
use std::time::Duration;

pub const DEFAULT_REFRESH_PERIOD_SECS: u64 = 300;

pub fn refresh_period_from_env() -> Duration {
    let secs = std::env::var("PICKEM_REFRESH_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_REFRESH_PERIOD_SECS);
    Duration::from_secs(secs)
}

/// Sleep needed to land on the next wall-clock boundary aligned to `period`
/// (cron-style: a 300 s period fires at :00, :05, :10, ...). At an exact
/// boundary the delay is one full period.
pub fn delay_until_next_tick(now: DateTime<Utc>, period: Duration) -> Duration {
    let period_nanos = period.as_secs().max(1) as u128 * 1_000_000_000;

    let secs = now.timestamp().rem_euclid(86_400) as u128;
    let elapsed_nanos = secs * 1_000_000_000 + now.timestamp_subsec_nanos() as u128;

    let remainder = elapsed_nanos % period_nanos;
    Duration::from_nanos((period_nanos - remainder) as u64)
}

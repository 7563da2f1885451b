use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Duration since the Unix epoch, zero if the clock is set before it
pub(crate) fn get_duration_since_epoch() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// return nanosecond
pub(crate) fn get_now_as_nanos() -> u128 {
    get_duration_since_epoch().as_nanos()
}

use std::time::{SystemTime, UNIX_EPOCH};

/// Marker stored as the last access time while a dispatch is running.
pub(crate) const IN_DISPATCH: u64 = u64::MAX;

/// Milliseconds since the Unix epoch.
///
/// This is the time base of [`Session::last_access_time`](crate::Session::last_access_time)
/// and [`Session::check_status`](crate::Session::check_status).
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
        .unwrap_or(0)
}

//! Expiry window checks for time-to-live values

/// Whether a reported remaining ttl lies in `(0, ttl_secs]`.
///
/// Negative values are the cache's sentinels for "no expiry" (-1) and
/// "missing key" (-2).
#[must_use]
pub fn ttl_within(remaining_secs: i64, ttl_secs: u64) -> bool {
    remaining_secs > 0 && u64::try_from(remaining_secs).is_ok_and(|r| r <= ttl_secs)
}

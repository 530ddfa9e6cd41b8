/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current Unix timestamp in seconds, as token expiry claims use it.
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

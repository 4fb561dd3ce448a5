use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::clock::ManualClock;

/// Builds a UTC instant, panicking on out-of-range input. Test use only.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .unwrap_or_else(|| panic!("invalid test instant {year}-{month}-{day} {hour}:{minute}:{second}"))
}

/// The booking moment used throughout the reminder scenarios: 2024-12-20 09:00 UTC.
pub fn booking_day_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(utc(2024, 12, 20, 9, 0, 0)))
}

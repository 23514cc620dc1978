use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

// ============== Day Keys ==============

const SECS_PER_DAY: i64 = 86_400;

/// Day key for a unix timestamp: whole UTC days since the epoch.
pub fn day_key_from_unix(secs: i64) -> i64 {
    secs.div_euclid(SECS_PER_DAY)
}

/// Source of the current day key. The ledger resets allowances when it changes.
pub trait Clock: Send + Sync {
    fn day_key(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn day_key(&self) -> i64 {
        day_key_from_unix(Utc::now().timestamp())
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    day: AtomicI64,
}

impl ManualClock {
    pub fn new(day: i64) -> Self {
        Self {
            day: AtomicI64::new(day),
        }
    }

    pub fn set(&self, day: i64) {
        self.day.store(day, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.day.fetch_add(days, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn day_key(&self) -> i64 {
        self.day.load(Ordering::SeqCst)
    }
}

// ============== Display Names ==============

pub const MAX_DISPLAY_NAME_CHARS: usize = 50;

/// Trimmed display name capped at [`MAX_DISPLAY_NAME_CHARS`]; falls back to the user id.
pub fn display_name(name: &str, user_id: i64) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return user_id.to_string();
    }
    trimmed.chars().take(MAX_DISPLAY_NAME_CHARS).collect()
}

use crate::core::types::{Timestamp, TimestampMs};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall clock used to timestamp signed requests
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> TimestampMs;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        // before-epoch clocks are clamped to 0
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as TimestampMs)
            .unwrap_or_default()
    }
}

/// Clock frozen at one instant, for deterministic signatures
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(TimestampMs);

impl FixedClock {
    pub const fn new(now_ms: TimestampMs) -> Self {
        Self(now_ms)
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> TimestampMs {
        self.0
    }
}

/// Saturates instead of overflowing for open-ended windows
pub const fn ts_sec_to_ms(ts: Timestamp) -> TimestampMs {
    ts.saturating_mul(1000)
}

pub const fn ts_ms_to_sec(ts: TimestampMs) -> Timestamp {
    ts / 1000
}

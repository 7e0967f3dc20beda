use std::sync::Mutex;

/// Source of wall-clock time in fractional Unix epoch seconds.
///
/// Timer state lives on disk and is shared between processes, so the clock
/// has to be comparable across restarts; a per-process monotonic clock is not.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
        nanos as f64 / 1_000_000_000.0
    }
}

/// A clock that only moves when told to. Used by tests and dry runs.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, secs: f64) {
        if let Ok(mut now) = self.now.lock() {
            *now += secs;
        }
    }

    pub fn set(&self, value: f64) {
        if let Ok(mut now) = self.now.lock() {
            *now = value;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.lock().map(|n| *n).unwrap_or_default()
    }
}

/// Format seconds as `HH:MM:SS` (hours keep growing past 99).
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    format!("{h:02}:{m:02}:{s:02}")
}

/// Current time as an RFC 3339 string, for `created_at`/`updated_at` fields.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

use crate::clock::format_duration;
use serde::{Deserialize, Serialize};

/// Key of a timer record in `timers.json`: `<task>:<todo_id>`.
pub fn timer_key(task: &str, todo_id: &str) -> String {
    format!("{task}:{todo_id}")
}

/// Persisted accumulation state of one todo's timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerRecord {
    /// Epoch seconds of the last start/resume.
    pub start_time: f64,
    /// Seconds accumulated before the currently open interval.
    pub elapsed: f64,
    pub is_running: bool,
    #[serde(default)]
    pub paused_at: Option<f64>,
}

impl TimerRecord {
    pub fn started(now: f64) -> Self {
        Self {
            start_time: now,
            elapsed: 0.0,
            is_running: true,
            paused_at: None,
        }
    }

    /// Length of the open interval at `now`; zero when paused or when the
    /// clock stepped backwards.
    pub fn open_interval(&self, now: f64) -> f64 {
        if self.is_running {
            (now - self.start_time).max(0.0)
        } else {
            0.0
        }
    }

    /// Total active seconds at `now`.
    pub fn total_at(&self, now: f64) -> f64 {
        self.elapsed + self.open_interval(now)
    }
}

/// Read-only view returned by timer queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerStatus {
    pub is_running: bool,
    pub elapsed: f64,
    pub formatted: String,
}

impl TimerStatus {
    pub fn idle() -> Self {
        Self::new(false, 0.0)
    }

    pub fn new(is_running: bool, elapsed: f64) -> Self {
        Self {
            is_running,
            elapsed,
            formatted: format_duration(elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        assert_eq!(timer_key("writing", "1"), "writing:1");
    }

    #[test]
    fn running_total_includes_open_interval() {
        let mut rec = TimerRecord::started(100.0);
        rec.elapsed = 30.0;
        assert_eq!(rec.total_at(110.0), 40.0);
        rec.is_running = false;
        assert_eq!(rec.total_at(500.0), 30.0);
    }

    #[test]
    fn clock_going_backwards_adds_nothing() {
        let rec = TimerRecord::started(100.0);
        assert_eq!(rec.total_at(90.0), 0.0);
    }

    #[test]
    fn persisted_shape() {
        let json = serde_json::to_value(TimerRecord::started(5.0)).unwrap();
        assert_eq!(json["start_time"], 5.0);
        assert_eq!(json["elapsed"], 0.0);
        assert_eq!(json["is_running"], true);
        assert!(json["paused_at"].is_null());
    }

    #[test]
    fn idle_status() {
        let s = TimerStatus::idle();
        assert!(!s.is_running);
        assert_eq!(s.formatted, "00:00:00");
    }
}

//! Timer state machine over `timers.json`.
//!
//! A record stores the seconds accumulated by closed intervals plus the start
//! of the open one. Pausing folds the open interval into `elapsed`; resuming
//! opens a new one. Because the whole state lives on disk, totals survive any
//! number of pause/resume cycles, process restarts, and independent readers
//! such as a live display polling in another process.

use fleck_core::{timer_key, Clock, SystemClock, TimerRecord, TimerStatus};
use fleck_store::{split_key, FleckPaths, TimerMap, TimerStore};
use std::sync::Arc;

pub struct TimerEngine {
    store: TimerStore,
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    pub fn new(paths: &FleckPaths) -> Self {
        Self::with_clock(paths, Arc::new(SystemClock))
    }

    pub fn with_clock(paths: &FleckPaths, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: TimerStore::new(paths),
            clock,
        }
    }

    /// Start or resume the timer.
    ///
    /// - no record: create one, running from now
    /// - paused: open a new interval, keeping the accumulated seconds
    /// - running: restart the open interval at now after folding it into
    ///   `elapsed`, so the total does not change
    pub fn start(&self, task: &str, todo_id: &str) -> anyhow::Result<TimerRecord> {
        let key = timer_key(task, todo_id);
        let now = self.clock.now();
        self.store.update(|map| {
            let record = match map.remove(&key) {
                None => {
                    tracing::info!(%key, "timer started");
                    TimerRecord::started(now)
                }
                Some(rec) if !rec.is_running => {
                    tracing::info!(%key, elapsed = rec.elapsed, "timer resumed");
                    TimerRecord {
                        start_time: now,
                        elapsed: rec.elapsed,
                        is_running: true,
                        paused_at: None,
                    }
                }
                Some(rec) => TimerRecord {
                    start_time: now,
                    elapsed: rec.total_at(now),
                    is_running: true,
                    paused_at: None,
                },
            };
            map.insert(key.clone(), record.clone());
            Ok(record)
        })
    }

    /// Pause a running timer and return its total. Without a record this is
    /// a no-op returning 0; an already paused timer is left untouched.
    pub fn pause(&self, task: &str, todo_id: &str) -> anyhow::Result<f64> {
        let key = timer_key(task, todo_id);
        if self.store.get(&key).is_none() {
            return Ok(0.0);
        }
        let now = self.clock.now();
        self.store.update(|map| {
            let Some(rec) = map.get_mut(&key) else {
                return Ok(0.0);
            };
            if rec.is_running {
                rec.elapsed = rec.total_at(now);
                rec.is_running = false;
                rec.paused_at = Some(now);
                tracing::info!(%key, elapsed = rec.elapsed, "timer paused");
            }
            Ok(rec.elapsed)
        })
    }

    /// Remove the record and return its final total, computed exactly as
    /// [`TimerEngine::query`] would. Returns 0 without a record.
    pub fn stop_and_collect(&self, task: &str, todo_id: &str) -> anyhow::Result<f64> {
        let key = timer_key(task, todo_id);
        if self.store.get(&key).is_none() {
            return Ok(0.0);
        }
        let now = self.clock.now();
        self.store.update(|map| {
            let total = map.remove(&key).map(|rec| rec.total_at(now)).unwrap_or(0.0);
            tracing::info!(%key, total, "timer stopped");
            Ok(total)
        })
    }

    /// Current state of the timer. Never writes.
    pub fn query(&self, task: &str, todo_id: &str) -> TimerStatus {
        match self.store.get(&timer_key(task, todo_id)) {
            None => TimerStatus::idle(),
            Some(rec) => TimerStatus::new(rec.is_running, rec.total_at(self.clock.now())),
        }
    }

    pub fn record(&self, task: &str, todo_id: &str) -> Option<TimerRecord> {
        self.store.get(&timer_key(task, todo_id))
    }

    pub fn all_records(&self) -> TimerMap {
        self.store.all()
    }

    /// All records of `task`, keyed by todo id.
    pub fn records_for(&self, task: &str) -> TimerMap {
        self.store
            .all()
            .into_iter()
            .filter_map(|(key, rec)| match split_key(&key) {
                Some((t, id)) if t == task => Some((id.to_string(), rec)),
                _ => None,
            })
            .collect()
    }

    /// Drop every record of `task`.
    pub fn remove_task(&self, task: &str) -> anyhow::Result<usize> {
        self.store.remove_task(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleck_core::ManualClock;

    struct Fixture {
        _tmp: tempfile::TempDir,
        clock: Arc<ManualClock>,
        engine: TimerEngine,
        paths: FleckPaths,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let paths = FleckPaths::discover(tmp.path());
        let clock = Arc::new(ManualClock::new(1_000.0));
        let engine = TimerEngine::with_clock(&paths, clock.clone());
        Fixture {
            _tmp: tmp,
            clock,
            engine,
            paths,
        }
    }

    #[test]
    fn query_without_record_is_idle() {
        let f = fixture();
        let s = f.engine.query("t", "1");
        assert!(!s.is_running);
        assert_eq!(s.elapsed, 0.0);
        assert_eq!(s.formatted, "00:00:00");
    }

    #[test]
    fn accumulates_across_pause_independent_of_pause_length() {
        let f = fixture();
        f.engine.start("t", "1").unwrap();
        f.clock.advance(5.0);
        assert_eq!(f.engine.pause("t", "1").unwrap(), 5.0);

        f.clock.advance(3_600.0);
        assert_eq!(f.engine.query("t", "1").elapsed, 5.0);

        f.engine.start("t", "1").unwrap();
        f.clock.advance(3.0);
        assert_eq!(f.engine.stop_and_collect("t", "1").unwrap(), 8.0);
        assert!(f.engine.record("t", "1").is_none());
    }

    #[test]
    fn many_cycles_sum_active_intervals() {
        let f = fixture();
        for _ in 0..10 {
            f.engine.start("t", "1").unwrap();
            f.clock.advance(2.0);
            f.engine.pause("t", "1").unwrap();
            f.clock.advance(100.0);
        }
        assert_eq!(f.engine.query("t", "1").elapsed, 20.0);
    }

    #[test]
    fn state_survives_a_new_engine() {
        let f = fixture();
        f.engine.start("t", "1").unwrap();
        f.clock.advance(4.0);

        let restarted = TimerEngine::with_clock(&f.paths, f.clock.clone());
        f.clock.advance(1.0);
        let s = restarted.query("t", "1");
        assert!(s.is_running);
        assert_eq!(s.elapsed, 5.0);
    }

    #[test]
    fn stop_is_not_less_than_last_query() {
        let f = fixture();
        f.engine.start("t", "1").unwrap();
        f.clock.advance(7.25);
        let seen = f.engine.query("t", "1").elapsed;
        f.clock.advance(0.5);
        let total = f.engine.stop_and_collect("t", "1").unwrap();
        assert!(total >= seen);
    }

    #[test]
    fn pause_and_stop_without_record_are_noops() {
        let f = fixture();
        assert_eq!(f.engine.pause("t", "9").unwrap(), 0.0);
        assert_eq!(f.engine.stop_and_collect("t", "9").unwrap(), 0.0);
        assert!(!f.paths.timers_json.exists());
    }

    #[test]
    fn second_pause_does_not_double_count() {
        let f = fixture();
        f.engine.start("t", "1").unwrap();
        f.clock.advance(5.0);
        f.engine.pause("t", "1").unwrap();
        f.clock.advance(5.0);
        assert_eq!(f.engine.pause("t", "1").unwrap(), 5.0);
    }

    #[test]
    fn start_while_running_keeps_total() {
        let f = fixture();
        f.engine.start("t", "1").unwrap();
        f.clock.advance(6.0);
        let rec = f.engine.start("t", "1").unwrap();
        assert_eq!(rec.start_time, 1_006.0);
        assert_eq!(rec.elapsed, 6.0);
        f.clock.advance(1.0);
        assert_eq!(f.engine.query("t", "1").elapsed, 7.0);
    }

    #[test]
    fn paused_record_tracks_pause_instant() {
        let f = fixture();
        f.engine.start("t", "1").unwrap();
        f.clock.advance(2.0);
        f.engine.pause("t", "1").unwrap();
        let rec = f.engine.record("t", "1").unwrap();
        assert_eq!(rec.paused_at, Some(1_002.0));
        assert!(!rec.is_running);
        f.engine.start("t", "1").unwrap();
        assert_eq!(f.engine.record("t", "1").unwrap().paused_at, None);
    }

    #[test]
    fn records_for_filters_by_task() {
        let f = fixture();
        f.engine.start("a", "1").unwrap();
        f.engine.start("a", "2").unwrap();
        f.engine.start("ab", "1").unwrap();
        f.engine.start("a:b", "1").unwrap();
        let ids: Vec<String> = f.engine.records_for("a").into_keys().collect();
        assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(f.engine.remove_task("a").unwrap(), 2);
        assert!(f.engine.record("ab", "1").is_some());
        assert!(f.engine.record("a:b", "1").is_some());
    }
}

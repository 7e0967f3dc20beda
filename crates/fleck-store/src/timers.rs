use crate::document::JsonDocument;
use crate::paths::FleckPaths;
use fleck_core::TimerRecord;
use std::collections::BTreeMap;

/// Contents of `timers.json`: timer key → record.
pub type TimerMap = BTreeMap<String, TimerRecord>;

/// Persistence for timer records.
pub struct TimerStore {
    doc: JsonDocument<TimerMap>,
}

impl TimerStore {
    pub fn new(paths: &FleckPaths) -> Self {
        Self {
            doc: JsonDocument::new(&paths.timers_json),
        }
    }

    pub fn get(&self, key: &str) -> Option<TimerRecord> {
        self.doc.load().remove(key)
    }

    pub fn all(&self) -> TimerMap {
        self.doc.load()
    }

    /// Locked read-modify-write over the whole map.
    pub fn update<R, E>(&self, f: impl FnOnce(&mut TimerMap) -> Result<R, E>) -> Result<R, E>
    where
        E: From<anyhow::Error>,
    {
        self.doc.update(f)
    }

    /// Drop every record belonging to `task`. Returns how many were removed.
    pub fn remove_task(&self, task: &str) -> anyhow::Result<usize> {
        self.doc.update(|map| {
            let before = map.len();
            map.retain(|key, _| split_key(key).map(|(t, _)| t) != Some(task));
            Ok(before - map.len())
        })
    }
}

/// Split a timer key into `(task, todo_id)`. Todo ids never contain `:`,
/// so the last separator is the boundary.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once(':')
}

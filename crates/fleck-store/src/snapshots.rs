use crate::paths::FleckPaths;
use crate::replace_file;
use fleck_core::{validate_task_name, SnapshotSummary, WorkspaceSnapshot, RESERVED_POINTER_NAME};
use std::path::PathBuf;

/// One JSON file per task under `sessions/`. Saving overwrites.
pub struct SnapshotStore {
    paths: FleckPaths,
}

impl SnapshotStore {
    pub fn new(paths: &FleckPaths) -> Self {
        Self {
            paths: paths.clone(),
        }
    }

    /// File backing `task`'s snapshot. Names that could leave `sessions/`
    /// are refused.
    pub fn path_for(&self, task: &str) -> fleck_core::Result<PathBuf> {
        validate_task_name(task)?;
        Ok(self.paths.snapshot_file(task))
    }

    pub fn exists(&self, task: &str) -> bool {
        self.path_for(task).is_ok_and(|p| p.is_file())
    }

    /// Replace the task's snapshot with `snapshot`.
    pub fn save(&self, snapshot: &WorkspaceSnapshot) -> anyhow::Result<()> {
        let path = self.path_for(&snapshot.task_name)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        replace_file(&path, json.as_bytes())?;
        tracing::debug!(task = %snapshot.task_name, path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Load a snapshot. Missing and unparsable files both read as `None`.
    pub fn load(&self, task: &str) -> Option<WorkspaceSnapshot> {
        let path = self.path_for(task).ok()?;
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<WorkspaceSnapshot>(&content) {
            Ok(mut snap) => {
                if snap.task_name.is_empty() {
                    snap.task_name = task.to_string();
                }
                Some(snap)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt snapshot ignored");
                None
            }
        }
    }

    /// Delete a snapshot. Returns `false` if there was none.
    pub fn delete(&self, task: &str) -> anyhow::Result<bool> {
        let path = self.path_for(task)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(anyhow::anyhow!("cannot delete {}: {e}", path.display())),
        }
    }

    /// Summaries of all saved snapshots, sorted by task name.
    pub fn list(&self) -> Vec<SnapshotSummary> {
        let Ok(entries) = std::fs::read_dir(&self.paths.sessions_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .filter(|name| name != RESERVED_POINTER_NAME)
            .collect();
        names.sort();
        names
            .iter()
            .filter_map(|name| self.load(name).map(|s| s.summary()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleck_core::{AppEntry, BrowserTab, FolderEntry};
    use std::collections::BTreeMap;

    fn store() -> (tempfile::TempDir, SnapshotStore) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = FleckPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        let store = SnapshotStore::new(&paths);
        (tmp, store)
    }

    fn snapshot(task: &str) -> WorkspaceSnapshot {
        let mut browser_tabs = BTreeMap::new();
        browser_tabs.insert(
            "brave".to_string(),
            vec![
                BrowserTab {
                    title: "Rust".into(),
                    url: "https://www.rust-lang.org".into(),
                    visited_at: 1_760_000_000.25,
                },
                BrowserTab {
                    title: String::new(),
                    url: "https://example.com/?q=a&b=ü".into(),
                    visited_at: 1_759_999_000.0,
                },
            ],
        );
        WorkspaceSnapshot {
            task_name: task.to_string(),
            captured_at: Some("2026-10-17T09:00:00Z".into()),
            applications: vec![
                AppEntry {
                    process_name: "brave".into(),
                    window_title: "Rust - Brave".into(),
                    executable_path: "C:\\Brave\\brave.exe".into(),
                },
                AppEntry {
                    process_name: "Code".into(),
                    window_title: "main.rs — fleck".into(),
                    executable_path: "C:\\VS Code\\Code.exe".into(),
                },
            ],
            explorer_folders: vec![FolderEntry {
                display_name: "notes".into(),
                folder_path: "D:\\work\\notes".into(),
            }],
            browser_tabs,
        }
    }

    #[test]
    fn save_then_load_is_identical() {
        let (_tmp, store) = store();
        let snap = snapshot("writing");
        store.save(&snap).unwrap();
        let loaded = store.load("writing").unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let (_tmp, store) = store();
        store.save(&snapshot("writing")).unwrap();
        let mut smaller = snapshot("writing");
        smaller.applications.truncate(1);
        smaller.browser_tabs.clear();
        store.save(&smaller).unwrap();
        assert_eq!(store.load("writing").unwrap(), smaller);
    }

    #[test]
    fn load_missing_or_corrupt_is_none() {
        let (_tmp, store) = store();
        assert!(store.load("nothing").is_none());
        std::fs::write(store.path_for("broken").unwrap(), "[1, 2").unwrap();
        assert!(store.load("broken").is_none());
    }

    #[test]
    fn names_outside_sessions_dir_are_refused() {
        let (tmp, store) = store();
        std::fs::write(tmp.path().join("todos.json"), "{}").unwrap();
        for name in ["../todos", "a/b", "a\\b", "current_session"] {
            assert!(store.path_for(name).is_err(), "{name}");
            assert!(!store.exists(name));
            assert!(store.load(name).is_none());
            assert!(store.delete(name).is_err());
            assert!(store.save(&WorkspaceSnapshot::placeholder(name)).is_err());
        }
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("todos.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn legacy_snapshot_with_nulls_loads() {
        let (_tmp, store) = store();
        std::fs::write(
            store.path_for("old").unwrap(),
            r#"{
                "task_name": "old",
                "timestamp": "2025-03-01T10:00:00",
                "applications": [{"name": "notepad", "title": null, "path": null}],
                "explorer": [{"title": "docs", "path": null}],
                "chrome_tabs": [{"title": "Docs", "url": "https://docs.rs", "timestamp": 13000000000000000}]
            }"#,
        )
        .unwrap();
        let snap = store.load("old").unwrap();
        assert_eq!(snap.applications[0].executable_path, "");
        assert_eq!(snap.explorer_folders[0].folder_path, "");
        assert_eq!(snap.browser_tabs["chrome"][0].url, "https://docs.rs");
    }

    #[test]
    fn delete_reports_presence() {
        let (_tmp, store) = store();
        store.save(&snapshot("writing")).unwrap();
        assert!(store.delete("writing").unwrap());
        assert!(!store.delete("writing").unwrap());
        assert!(!store.exists("writing"));
    }

    #[test]
    fn list_skips_pointer_file() {
        let (tmp, store) = store();
        store.save(&snapshot("b-task")).unwrap();
        store.save(&WorkspaceSnapshot::placeholder("a-task")).unwrap();
        std::fs::write(
            tmp.path().join("sessions").join("current_session.json"),
            r#"{"current":"b-task"}"#,
        )
        .unwrap();

        let list = store.list();
        let names: Vec<&str> = list.iter().map(|s| s.task_name.as_str()).collect();
        assert_eq!(names, vec!["a-task", "b-task"]);
        assert_eq!(list[1].app_count, 2);
        assert_eq!(list[1].tab_counts.get("brave"), Some(&2));
    }
}

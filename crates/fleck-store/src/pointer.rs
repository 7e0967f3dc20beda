use crate::document::JsonDocument;
use crate::paths::FleckPaths;
use fleck_core::{validate_task_name, WorkspaceContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PointerDoc {
    #[serde(default)]
    current: String,
}

/// Persisted name of the active task (`sessions/current_session.json`).
pub struct PointerStore {
    doc: JsonDocument<PointerDoc>,
}

impl PointerStore {
    pub fn new(paths: &FleckPaths) -> Self {
        Self {
            doc: JsonDocument::new(&paths.current_session_json),
        }
    }

    /// The active task as an explicit context value. A stored name that is
    /// not a valid task name reads as no active task.
    pub fn context(&self) -> WorkspaceContext {
        let current = self.doc.load().current;
        if !current.trim().is_empty() && validate_task_name(&current).is_err() {
            tracing::warn!(name = %current, "ignoring invalid active task name");
            return WorkspaceContext::default();
        }
        WorkspaceContext::new(Some(current))
    }

    pub fn set(&self, task: &str) -> anyhow::Result<()> {
        validate_task_name(task)?;
        self.doc.update(|p| {
            p.current = task.to_string();
            Ok(())
        })
    }

    /// Clear the pointer if it names `task`. Returns whether it did.
    pub fn clear_if(&self, task: &str) -> anyhow::Result<bool> {
        self.doc.update(|p| {
            if p.current == task {
                p.current.clear();
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }
}

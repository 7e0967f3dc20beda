use crate::document::JsonDocument;
use crate::paths::FleckPaths;
use fleck_core::Task;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of `todos.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TodoDocument {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
}

impl TodoDocument {
    /// Next sequential task id.
    pub fn next_task_id(&self) -> u64 {
        self.tasks.values().map(|t| t.id).max().unwrap_or(0) + 1
    }
}

/// Persistence for tasks and their todos.
pub struct TodoStore {
    doc: JsonDocument<TodoDocument>,
}

impl TodoStore {
    pub fn new(paths: &FleckPaths) -> Self {
        Self {
            doc: JsonDocument::new(&paths.todos_json),
        }
    }

    pub fn load(&self) -> TodoDocument {
        self.doc.load()
    }

    pub fn task(&self, name: &str) -> Option<Task> {
        self.doc.load().tasks.remove(name)
    }

    pub fn update<R, E>(&self, f: impl FnOnce(&mut TodoDocument) -> Result<R, E>) -> Result<R, E>
    where
        E: From<anyhow::Error>,
    {
        self.doc.update(f)
    }
}

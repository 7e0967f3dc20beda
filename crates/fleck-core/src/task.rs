use crate::error::{FleckError, Result};
use crate::snapshot::RESERVED_POINTER_NAME;
use crate::status::{Priority, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A unit of work inside a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Todo {
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: String,
    pub updated_at: String,
    /// Seconds of active work, recorded when the todo reaches Done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
}

impl Todo {
    pub fn new(description: &str, priority: Priority, now: &str) -> Self {
        Self {
            description: description.to_string(),
            status: Status::ToDo,
            priority,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            time_spent: None,
        }
    }
}

/// A named workspace with its todo list. The name is the key in `todos.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: u64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub todos: BTreeMap<String, Todo>,
}

impl Task {
    pub fn new(id: u64, now: &str) -> Self {
        Self {
            id,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            todos: BTreeMap::new(),
        }
    }

    /// Allocate the id for a new todo: `count + 1`, probing upward past ids
    /// that are still taken. An id freed by deleting the last todo is reused.
    pub fn next_todo_id(&self) -> String {
        let mut candidate = self.todos.len() as u64 + 1;
        while self.todos.contains_key(&candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Todos in creation order. Ids are reused after deletions, so they
    /// only break ties between todos created in the same instant.
    pub fn ordered_todos(&self) -> Vec<(&String, &Todo)> {
        let mut todos: Vec<(&String, &Todo)> = self.todos.iter().collect();
        todos.sort_by(|(a_id, a), (b_id, b)| {
            created_nanos(&a.created_at)
                .cmp(&created_nanos(&b.created_at))
                .then_with(|| numeric_id(a_id).cmp(&numeric_id(b_id)))
                .then_with(|| a_id.cmp(b_id))
        });
        todos
    }

    pub fn todo(&self, task: &str, todo_id: &str) -> Result<&Todo> {
        self.todos
            .get(todo_id)
            .ok_or_else(|| FleckError::TodoNotFound {
                task: task.to_string(),
                todo_id: todo_id.to_string(),
            })
    }

    pub fn todo_mut(&mut self, task: &str, todo_id: &str) -> Result<&mut Todo> {
        self.todos
            .get_mut(todo_id)
            .ok_or_else(|| FleckError::TodoNotFound {
                task: task.to_string(),
                todo_id: todo_id.to_string(),
            })
    }

    pub fn count_by_status(&self, status: Status) -> usize {
        self.todos.values().filter(|t| t.status == status).count()
    }
}

/// The task that todo and timer operations act on.
///
/// Built once per invocation from the persisted pointer and passed down
/// explicitly, so library code never reads process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceContext {
    current: Option<String>,
}

impl WorkspaceContext {
    pub fn new(current: Option<String>) -> Self {
        let current = current.filter(|c| !c.trim().is_empty());
        Self { current }
    }

    pub fn for_task(task: &str) -> Self {
        Self::new(Some(task.to_string()))
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The active task name, or [`FleckError::NoActiveTask`].
    pub fn require_task(&self) -> Result<&str> {
        self.current.as_deref().ok_or(FleckError::NoActiveTask)
    }
}

/// `created_at` as nanoseconds since the epoch. Timestamps without an
/// offset are read as UTC; unreadable ones sort last.
fn created_nanos(ts: &str) -> i128 {
    use time::format_description::well_known::{Iso8601, Rfc3339};
    time::OffsetDateTime::parse(ts, &Rfc3339)
        .or_else(|_| time::PrimitiveDateTime::parse(ts, &Iso8601::DEFAULT).map(|p| p.assume_utc()))
        .map(|t| t.unix_timestamp_nanos())
        .unwrap_or(i128::MAX)
}

fn numeric_id(id: &str) -> u64 {
    id.parse().unwrap_or(u64::MAX)
}

/// Task names double as file names under `sessions/` and as the prefix of
/// timer keys (`<task>:<todo>`).
pub fn validate_task_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed != name
        || name.contains(['/', '\\', ':'])
        || name.contains("..")
        || name == RESERVED_POINTER_NAME;
    if bad {
        return Err(FleckError::InvalidName(name.to_string()));
    }
    Ok(())
}

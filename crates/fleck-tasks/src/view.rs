use crate::registry::TaskRegistry;
use fleck_core::{
    format_duration, Priority, Result, SnapshotSummary, Status, WorkspaceContext,
};
use std::collections::BTreeMap;

/// One row of `fleck list`.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoView {
    pub id: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub created_at: String,
    /// `time_spent` for Done items, the live timer total otherwise.
    pub seconds: f64,
}

impl TodoView {
    pub fn time_label(&self) -> String {
        match self.status {
            Status::ToDo => "-".to_string(),
            Status::Done => format_duration(self.seconds),
            Status::InProgress => format!("{} (running)", format_duration(self.seconds)),
            Status::Paused => format!("{} (paused)", format_duration(self.seconds)),
        }
    }
}

/// One row of `fleck tasks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOverview {
    pub name: String,
    /// `None` for a snapshot without a todo list.
    pub id: Option<u64>,
    pub is_current: bool,
    pub snapshot: Option<SnapshotSummary>,
    pub todo_count: usize,
    pub done_count: usize,
}

impl TaskRegistry {
    /// Todos of the active task in id order, optionally filtered by status.
    pub fn list_todos(
        &self,
        ctx: &WorkspaceContext,
        filter: Option<Status>,
    ) -> Result<Vec<TodoView>> {
        let task_name = ctx.require_task()?;
        let task = self.task(task_name)?;
        let rows = task
            .ordered_todos()
            .into_iter()
            .filter(|(_, todo)| filter.map_or(true, |status| todo.status == status))
            .map(|(id, todo)| {
                let seconds = match todo.status {
                    Status::ToDo => 0.0,
                    Status::Done => todo.time_spent.unwrap_or(0.0),
                    Status::InProgress | Status::Paused => {
                        self.timers.query(task_name, id).elapsed
                    }
                };
                TodoView {
                    id: id.clone(),
                    description: todo.description.clone(),
                    status: todo.status,
                    priority: todo.priority,
                    created_at: todo.created_at.clone(),
                    seconds,
                }
            })
            .collect();
        Ok(rows)
    }

    /// Every known task, from the todo list and the snapshot directory,
    /// ordered by task id.
    pub fn list_tasks(&self) -> Vec<TaskOverview> {
        let current = self.context();
        let mut rows: BTreeMap<String, TaskOverview> = BTreeMap::new();

        for (name, task) in self.todos.load().tasks {
            rows.insert(
                name.clone(),
                TaskOverview {
                    is_current: current.current() == Some(name.as_str()),
                    name,
                    id: Some(task.id),
                    snapshot: None,
                    todo_count: task.todos.len(),
                    done_count: task.count_by_status(Status::Done),
                },
            );
        }
        for summary in self.snapshots.list() {
            let name = summary.task_name.clone();
            let row = rows.entry(name.clone()).or_insert_with(|| TaskOverview {
                is_current: current.current() == Some(name.as_str()),
                name,
                id: None,
                snapshot: None,
                todo_count: 0,
                done_count: 0,
            });
            row.snapshot = Some(summary);
        }

        let mut rows: Vec<TaskOverview> = rows.into_values().collect();
        rows.sort_by(|a, b| {
            (a.id.unwrap_or(u64::MAX), &a.name).cmp(&(b.id.unwrap_or(u64::MAX), &b.name))
        });
        rows
    }
}

use crate::registry::TaskRegistry;
use fleck_core::{timer_key, Result, Status};
use std::fmt;

/// A status/timer mismatch found by [`TaskRegistry::repair`].
///
/// These appear when a process dies between the timer write and the todo
/// write of a status change, or when the files are edited by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    /// Timer for a todo that is missing, ToDo, or Done.
    RemoveStrayTimer { task: String, todo_id: String },
    /// InProgress todo without a running timer.
    StartTimer { task: String, todo_id: String },
    /// Paused todo whose timer is still running.
    PauseTimer { task: String, todo_id: String },
    /// Paused todo with no timer at all.
    CreatePausedTimer { task: String, todo_id: String },
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveStrayTimer { task, todo_id } => {
                write!(f, "remove stray timer {}", timer_key(task, todo_id))
            }
            Self::StartTimer { task, todo_id } => {
                write!(f, "start timer for in-progress todo {}", timer_key(task, todo_id))
            }
            Self::PauseTimer { task, todo_id } => {
                write!(f, "pause running timer of paused todo {}", timer_key(task, todo_id))
            }
            Self::CreatePausedTimer { task, todo_id } => {
                write!(f, "create paused timer for {}", timer_key(task, todo_id))
            }
        }
    }
}

impl TaskRegistry {
    /// Find todos whose status disagrees with their timer. With `apply`, fix
    /// each one by adjusting the timer; todo statuses are never changed.
    pub fn repair(&self, apply: bool) -> Result<Vec<RepairAction>> {
        let doc = self.todos.load();
        let timers = self.timers.all_records();
        let mut actions = Vec::new();

        for (key, record) in &timers {
            let Some((task, todo_id)) = key.rsplit_once(':') else {
                continue;
            };
            let status = doc
                .tasks
                .get(task)
                .and_then(|t| t.todos.get(todo_id))
                .map(|todo| todo.status);
            let (task, todo_id) = (task.to_string(), todo_id.to_string());
            match status {
                None | Some(Status::ToDo) | Some(Status::Done) => {
                    actions.push(RepairAction::RemoveStrayTimer { task, todo_id })
                }
                Some(Status::Paused) if record.is_running => {
                    actions.push(RepairAction::PauseTimer { task, todo_id })
                }
                Some(_) => {}
            }
        }

        for (task_name, task) in &doc.tasks {
            for (todo_id, todo) in task.ordered_todos() {
                let record = timers.get(&timer_key(task_name, todo_id));
                let (task, todo_id) = (task_name.clone(), todo_id.clone());
                match (todo.status, record) {
                    (Status::InProgress, None) => {
                        actions.push(RepairAction::StartTimer { task, todo_id })
                    }
                    (Status::InProgress, Some(rec)) if !rec.is_running => {
                        actions.push(RepairAction::StartTimer { task, todo_id })
                    }
                    (Status::Paused, None) => {
                        actions.push(RepairAction::CreatePausedTimer { task, todo_id })
                    }
                    _ => {}
                }
            }
        }

        if apply {
            for action in &actions {
                self.apply_repair(action)?;
                tracing::info!(%action, "repaired");
            }
        }
        Ok(actions)
    }

    fn apply_repair(&self, action: &RepairAction) -> Result<()> {
        match action {
            RepairAction::RemoveStrayTimer { task, todo_id } => {
                self.timers.stop_and_collect(task, todo_id)?;
            }
            RepairAction::StartTimer { task, todo_id } => {
                self.timers.start(task, todo_id)?;
            }
            RepairAction::PauseTimer { task, todo_id } => {
                self.timers.pause(task, todo_id)?;
            }
            RepairAction::CreatePausedTimer { task, todo_id } => {
                self.timers.start(task, todo_id)?;
                self.timers.pause(task, todo_id)?;
            }
        }
        Ok(())
    }
}

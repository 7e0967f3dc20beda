use fleck_core::{
    format_duration, is_valid_transition, now_rfc3339, validate_task_name, Clock, FleckError,
    Outcome, Priority, Result, Status, SystemClock, Task, Todo, WorkspaceContext,
    WorkspaceSnapshot,
};
use fleck_store::{FleckPaths, PointerStore, SnapshotStore, TodoDocument, TodoStore};
use fleck_timer::TimerEngine;
use std::sync::Arc;

/// Tasks and their todos, with status changes coupled to the timers.
///
/// Every status change runs inside the locked update of `todos.json`, and the
/// timer side effect is written before the todo itself. Lock order is always
/// todos then timers.
pub struct TaskRegistry {
    pub(crate) todos: TodoStore,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) pointer: PointerStore,
    pub(crate) timers: TimerEngine,
}

/// A status change that was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub todo_id: String,
    pub from: Status,
    pub to: Status,
    /// Timer total right after the change.
    pub elapsed: f64,
}

impl Transition {
    pub fn outcome(&self) -> Outcome {
        let id = &self.todo_id;
        let time = format_duration(self.elapsed);
        match (self.from, self.to) {
            (Status::Paused, Status::InProgress) => {
                Outcome::ok(format!("Resumed todo #{id}. Timer started."))
            }
            (_, Status::InProgress) => {
                Outcome::ok(format!("Marked todo #{id} as in progress. Timer started."))
            }
            (_, Status::Paused) => {
                Outcome::ok(format!("Paused todo #{id}. Current elapsed time: {time}"))
            }
            (_, Status::Done) => Outcome::ok(format!("Completed todo #{id}. Total time: {time}")),
            (_, Status::ToDo) => Outcome::ok(format!("Todo #{id} reset.")),
        }
    }
}

/// What `delete_task` removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub snapshot_removed: bool,
    pub task_removed: bool,
    pub timers_removed: usize,
    pub pointer_cleared: bool,
}

pub(crate) fn task_mut<'a>(doc: &'a mut TodoDocument, name: &str) -> Result<&'a mut Task> {
    doc.tasks
        .get_mut(name)
        .ok_or_else(|| FleckError::TaskNotFound(name.to_string()))
}

impl TaskRegistry {
    pub fn new(paths: &FleckPaths) -> Self {
        Self::with_clock(paths, Arc::new(SystemClock))
    }

    pub fn with_clock(paths: &FleckPaths, clock: Arc<dyn Clock>) -> Self {
        Self {
            todos: TodoStore::new(paths),
            snapshots: SnapshotStore::new(paths),
            pointer: PointerStore::new(paths),
            timers: TimerEngine::with_clock(paths, clock),
        }
    }

    pub fn timers(&self) -> &TimerEngine {
        &self.timers
    }

    /// The persisted active task, as the context for todo operations.
    pub fn context(&self) -> WorkspaceContext {
        self.pointer.context()
    }

    /// A task is known if it has a todo list or a snapshot. Invalid names
    /// are never known.
    pub fn task_exists(&self, name: &str) -> bool {
        if validate_task_name(name).is_err() {
            return false;
        }
        self.todos.task(name).is_some() || self.snapshots.exists(name)
    }

    pub fn task(&self, name: &str) -> Result<Task> {
        self.todos
            .task(name)
            .ok_or_else(|| FleckError::TaskNotFound(name.to_string()))
    }

    // ── Tasks ──

    /// Register a new task with an empty todo list and an empty snapshot.
    pub fn create_task(&self, name: &str) -> Result<Task> {
        validate_task_name(name)?;
        if self.snapshots.exists(name) {
            return Err(FleckError::AlreadyExists(name.to_string()));
        }
        let now = now_rfc3339();
        let task = self.todos.update(|doc| -> Result<Task> {
            if doc.tasks.contains_key(name) {
                return Err(FleckError::AlreadyExists(name.to_string()));
            }
            let task = Task::new(doc.next_task_id(), &now);
            doc.tasks.insert(name.to_string(), task.clone());
            Ok(task)
        })?;
        self.snapshots.save(&WorkspaceSnapshot::placeholder(name))?;
        tracing::info!(task = name, id = task.id, "task created");
        Ok(task)
    }

    /// Point the workspace at `name`. Unknown names are accepted with a
    /// warning since the pointer is only a default for later commands.
    pub fn set_active(&self, name: &str) -> Result<()> {
        validate_task_name(name)?;
        if !self.task_exists(name) {
            tracing::warn!(task = name, "activating unknown task");
        }
        self.pointer.set(name)?;
        Ok(())
    }

    /// Remove a task's snapshot, todo list, timers, and the pointer if it
    /// names the task.
    pub fn delete_task(&self, name: &str) -> Result<DeleteReport> {
        validate_task_name(name)?;
        if !self.task_exists(name) && self.timers.records_for(name).is_empty() {
            return Err(FleckError::TaskNotFound(name.to_string()));
        }
        let timers_removed = self.timers.remove_task(name)?;
        let task_removed = self
            .todos
            .update(|doc| Ok::<_, FleckError>(doc.tasks.remove(name).is_some()))?;
        let snapshot_removed = self.snapshots.delete(name)?;
        let pointer_cleared = self.pointer.clear_if(name)?;
        tracing::info!(task = name, timers_removed, "task deleted");
        Ok(DeleteReport {
            snapshot_removed,
            task_removed,
            timers_removed,
            pointer_cleared,
        })
    }

    // ── Todos ──

    /// Append a todo to the active task and return its id.
    pub fn add_todo(
        &self,
        ctx: &WorkspaceContext,
        description: &str,
        priority: Priority,
    ) -> Result<String> {
        let task_name = ctx.require_task()?;
        let now = now_rfc3339();
        let id = self.todos.update(|doc| -> Result<String> {
            let task = task_mut(doc, task_name)?;
            let id = task.next_todo_id();
            task.todos
                .insert(id.clone(), Todo::new(description, priority, &now));
            task.updated_at = now.clone();
            Ok(id)
        })?;
        tracing::info!(task = task_name, todo = %id, "todo added");
        Ok(id)
    }

    /// Move a todo along the status machine and apply the timer effect:
    /// entering InProgress starts the timer, entering Paused pauses it, and
    /// entering Done stops it and records the total as `time_spent`.
    pub fn transition(
        &self,
        ctx: &WorkspaceContext,
        todo_id: &str,
        target: Status,
    ) -> Result<Transition> {
        self.apply_transition(ctx, todo_id, target, None)
    }

    /// ToDo or Paused → InProgress.
    pub fn progress(&self, ctx: &WorkspaceContext, todo_id: &str) -> Result<Transition> {
        self.transition(ctx, todo_id, Status::InProgress)
    }

    pub fn pause(&self, ctx: &WorkspaceContext, todo_id: &str) -> Result<Transition> {
        self.transition(ctx, todo_id, Status::Paused)
    }

    /// Paused → InProgress only.
    pub fn resume(&self, ctx: &WorkspaceContext, todo_id: &str) -> Result<Transition> {
        self.apply_transition(ctx, todo_id, Status::InProgress, Some(Status::Paused))
    }

    pub fn done(&self, ctx: &WorkspaceContext, todo_id: &str) -> Result<Transition> {
        self.transition(ctx, todo_id, Status::Done)
    }

    /// Make sure a todo about to be shown in the live timer is being timed.
    /// A ToDo item is promoted to InProgress; any other status is left alone.
    /// Returns the todo as it stands afterwards.
    pub fn begin_timing(&self, ctx: &WorkspaceContext, todo_id: &str) -> Result<Todo> {
        let task_name = ctx.require_task()?;
        let task = self.task(task_name)?;
        if task.todo(task_name, todo_id)?.status == Status::ToDo {
            self.transition(ctx, todo_id, Status::InProgress)?;
        }
        let task = self.task(task_name)?;
        Ok(task.todo(task_name, todo_id)?.clone())
    }

    fn apply_transition(
        &self,
        ctx: &WorkspaceContext,
        todo_id: &str,
        target: Status,
        required_from: Option<Status>,
    ) -> Result<Transition> {
        let task_name = ctx.require_task()?;
        let now = now_rfc3339();
        let applied = self.todos.update(|doc| -> Result<Transition> {
            let task = task_mut(doc, task_name)?;
            let todo = task.todo_mut(task_name, todo_id)?;
            let from = todo.status;
            let allowed = is_valid_transition(from, target)
                && required_from.map_or(true, |required| required == from);
            if !allowed {
                return Err(FleckError::InvalidTransition {
                    todo_id: todo_id.to_string(),
                    from,
                    to: target,
                });
            }

            let elapsed = match target {
                Status::InProgress => self.timers.start(task_name, todo_id)?.elapsed,
                Status::Paused => self.timers.pause(task_name, todo_id)?,
                Status::Done => {
                    let total = self.timers.stop_and_collect(task_name, todo_id)?;
                    todo.time_spent = Some(total);
                    total
                }
                Status::ToDo => 0.0,
            };
            todo.status = target;
            todo.updated_at = now.clone();
            task.updated_at = now.clone();
            Ok(Transition {
                todo_id: todo_id.to_string(),
                from,
                to: target,
                elapsed,
            })
        })?;
        tracing::info!(
            task = task_name,
            todo = todo_id,
            from = %applied.from,
            to = %applied.to,
            "todo status changed"
        );
        Ok(applied)
    }

    /// Delete a todo, clearing its timer first. Returns the seconds the
    /// timer held.
    pub fn delete_todo(&self, ctx: &WorkspaceContext, todo_id: &str) -> Result<f64> {
        let task_name = ctx.require_task()?;
        let now = now_rfc3339();
        self.todos.update(|doc| {
            let task = task_mut(doc, task_name)?;
            task.todo(task_name, todo_id)?;
            let collected = self.timers.stop_and_collect(task_name, todo_id)?;
            task.todos.remove(todo_id);
            task.updated_at = now.clone();
            tracing::info!(task = task_name, todo = todo_id, "todo deleted");
            Ok(collected)
        })
    }

    pub fn set_priority(
        &self,
        ctx: &WorkspaceContext,
        todo_id: &str,
        priority: Priority,
    ) -> Result<()> {
        let task_name = ctx.require_task()?;
        let now = now_rfc3339();
        self.todos.update(|doc| {
            let task = task_mut(doc, task_name)?;
            let todo = task.todo_mut(task_name, todo_id)?;
            todo.priority = priority;
            todo.updated_at = now.clone();
            task.updated_at = now.clone();
            Ok(())
        })
    }
}

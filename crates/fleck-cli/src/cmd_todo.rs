use crate::render::{clip, short_time};
use fleck_core::{format_duration, Outcome, Priority, Status};
use fleck_store::FleckPaths;
use fleck_tasks::{TaskRegistry, TodoView};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy)]
pub enum Action {
    Progress,
    Pause,
    Resume,
    Done,
}

/// `fleck add <description> [--priority p]`
pub fn add(paths: &FleckPaths, description: &str, priority: Priority) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    let ctx = registry.context();
    let id = registry.add_todo(&ctx, description, priority)?;
    let task = ctx.require_task()?;
    println!(
        "{}",
        Outcome::ok(format!("Added todo #{id} to task '{task}': {description}"))
    );
    Ok(())
}

/// `fleck list [filter]`
pub fn list(paths: &FleckPaths, filter: Option<Status>) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    let ctx = registry.context();
    let task = ctx.require_task()?;
    let todos = registry.list_todos(&ctx, filter)?;
    if todos.is_empty() {
        match filter {
            Some(status) => println!("No {status} todos in task '{task}'."),
            None => println!("No todos in task '{task}'. Add one with `fleck add`."),
        }
        return Ok(());
    }
    println!("Todos for task '{task}'");
    print!("{}", format_todos(&todos));
    Ok(())
}

fn format_todos(todos: &[TodoView]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<40} {:<12} {:<8} {:<22} CREATED",
        "ID", "DESCRIPTION", "STATUS", "PRIORITY", "TIME"
    );
    for todo in todos {
        let _ = writeln!(
            out,
            "{:>4}  {:<40} {:<12} {:<8} {:<22} {}",
            todo.id,
            clip(&todo.description, 40),
            todo.status.to_string(),
            todo.priority.to_string(),
            todo.time_label(),
            short_time(&todo.created_at)
        );
    }
    out
}

/// `fleck flag <id> <priority>`
pub fn flag(paths: &FleckPaths, todo_id: &str, priority: Priority) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    registry.set_priority(&registry.context(), todo_id, priority)?;
    println!(
        "{}",
        Outcome::ok(format!("Set priority of todo #{todo_id} to {priority}"))
    );
    Ok(())
}

/// `fleck delete <id>`
pub fn delete(paths: &FleckPaths, todo_id: &str) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    let collected = registry.delete_todo(&registry.context(), todo_id)?;
    let mut message = format!("Deleted todo #{todo_id}");
    if collected > 0.0 {
        message.push_str(&format!(" (discarded {})", format_duration(collected)));
    }
    println!("{}", Outcome::ok(message));
    Ok(())
}

/// `fleck progress|pause|resume|done <id>`
pub fn transition(paths: &FleckPaths, todo_id: &str, action: Action) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    let ctx = registry.context();
    let result = match action {
        Action::Progress => registry.progress(&ctx, todo_id)?,
        Action::Pause => registry.pause(&ctx, todo_id)?,
        Action::Resume => registry.resume(&ctx, todo_id)?,
        Action::Done => registry.done(&ctx, todo_id)?,
    };
    println!("{}", result.outcome());
    Ok(())
}

use crate::cmd_snapshot::{resolve_task, system_engine};
use crate::render::short_time;
use fleck_core::{validate_task_name, FleckError, Outcome};
use fleck_store::FleckPaths;
use fleck_tasks::{TaskOverview, TaskRegistry};
use std::fmt::Write as _;

/// `fleck create <name>`
pub fn create(paths: &FleckPaths, name: &str) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    let task = registry.create_task(name)?;
    registry.set_active(name)?;
    println!(
        "{}",
        Outcome::ok(format!(
            "Workspace '{name}' created (task #{}) and set as current",
            task.id
        ))
    );
    println!("Run `fleck save` to capture the applications you have open.");
    Ok(())
}

/// `fleck delete-workspace [name] [--yes]`
pub fn delete(paths: &FleckPaths, name: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let task = resolve_task(paths, name)?;
    let registry = TaskRegistry::new(paths);
    if !registry.task_exists(&task) {
        return Err(FleckError::TaskNotFound(task).into());
    }

    if !yes {
        eprint!("Delete workspace '{task}' with its todos and timers? [y/N] ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let report = registry.delete_task(&task)?;
    let mut removed = Vec::new();
    if report.snapshot_removed {
        removed.push("snapshot".to_string());
    }
    if report.task_removed {
        removed.push("todos".to_string());
    }
    if report.timers_removed > 0 {
        removed.push(format!("{} timer(s)", report.timers_removed));
    }
    println!(
        "{}",
        Outcome::ok(format!(
            "Workspace '{task}' deleted ({})",
            if removed.is_empty() {
                "nothing stored".to_string()
            } else {
                removed.join(", ")
            }
        ))
    );
    if report.pointer_cleared {
        println!("No workspace is active now. Use `fleck switch <name>`.");
    }
    Ok(())
}

/// `fleck switch <name> [--save] [--restore]`
pub fn switch(paths: &FleckPaths, name: &str, save: bool, restore: bool) -> anyhow::Result<()> {
    validate_task_name(name)?;
    let registry = TaskRegistry::new(paths);
    if !registry.task_exists(name) {
        return Err(FleckError::TaskNotFound(name.to_string()).into());
    }

    let current = registry.context();
    if current.current() == Some(name) {
        println!("Already on workspace '{name}'");
    } else {
        if save {
            if let Some(from) = current.current() {
                match system_engine(paths).capture(from) {
                    Ok(_) => println!("{}", Outcome::ok(format!("Session saved for task: {from}"))),
                    Err(err) => eprintln!("{}", Outcome::from(&err)),
                }
            }
        }
        registry.set_active(name)?;
        println!("Switched to workspace '{name}'");
    }

    if restore {
        crate::cmd_snapshot::restore(paths, Some(name))?;
    }
    Ok(())
}

/// `fleck current`
pub fn current(paths: &FleckPaths) -> anyhow::Result<()> {
    let ctx = TaskRegistry::new(paths).context();
    match ctx.current() {
        Some(task) => println!("{task}"),
        None => println!("(no active workspace)"),
    }
    Ok(())
}

/// `fleck tasks`
pub fn tasks(paths: &FleckPaths) -> anyhow::Result<()> {
    let rows = TaskRegistry::new(paths).list_tasks();
    if rows.is_empty() {
        println!("No workspaces yet. Run `fleck create <name>`.");
        return Ok(());
    }
    print!("{}", format_tasks(&rows));
    Ok(())
}

fn format_tasks(rows: &[TaskOverview]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<4} {:<20} {:>5} {:>5} {:>8} {:>7}  SAVED",
        "ID", "NAME", "APPS", "TABS", "FOLDERS", "TODOS"
    );
    for row in rows {
        let marker = if row.is_current { "*" } else { " " };
        let id = row.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
        let (apps, tabs, folders, saved) = match &row.snapshot {
            Some(s) => (
                s.app_count.to_string(),
                s.total_tabs().to_string(),
                s.folder_count.to_string(),
                s.captured_at
                    .as_deref()
                    .map(short_time)
                    .unwrap_or_else(|| "never".into()),
            ),
            None => ("-".into(), "-".into(), "-".into(), "never".into()),
        };
        let todos = format!("{}/{}", row.done_count, row.todo_count);
        let _ = writeln!(
            out,
            "{marker} {id:<4} {:<20} {apps:>5} {tabs:>5} {folders:>8} {todos:>7}  {saved}",
            row.name
        );
    }
    out
}

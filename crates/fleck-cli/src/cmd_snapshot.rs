use crate::render::{clip, short_time};
use fleck_core::{validate_task_name, FleckError, Outcome, WorkspaceSnapshot};
use fleck_restore::{ChromiumHistory, RestoreEngine, SystemInventory, SystemLauncher};
use fleck_store::{FleckConfig, FleckPaths, PointerStore, SnapshotStore};
use std::fmt::Write as _;
use std::sync::Arc;

/// Restore engine wired to the real desktop.
pub(crate) fn system_engine(paths: &FleckPaths) -> RestoreEngine {
    let config = FleckConfig::load(paths);
    let tabs = Arc::new(ChromiumHistory::new(config.tab_limit));
    RestoreEngine::new(
        paths,
        config,
        Arc::new(SystemInventory),
        tabs,
        Arc::new(SystemLauncher),
    )
}

/// `name`, or the active workspace when `None`.
pub(crate) fn resolve_task(paths: &FleckPaths, name: Option<&str>) -> anyhow::Result<String> {
    match name {
        Some(name) => {
            validate_task_name(name)?;
            Ok(name.to_string())
        }
        None => {
            let ctx = PointerStore::new(paths).context();
            Ok(ctx.require_task()?.to_string())
        }
    }
}

/// `fleck save`
pub fn save(paths: &FleckPaths) -> anyhow::Result<()> {
    let task = resolve_task(paths, None)?;
    let engine = system_engine(paths);
    let snapshot = engine.capture(&task)?;
    let summary = snapshot.summary();
    println!(
        "{}",
        Outcome::ok(format!(
            "Session saved for task: {task} ({} apps, {} tabs, {} folders)",
            summary.app_count,
            summary.total_tabs(),
            summary.folder_count
        ))
    );
    Ok(())
}

/// `fleck restore [name]`
pub fn restore(paths: &FleckPaths, name: Option<&str>) -> anyhow::Result<()> {
    let task = resolve_task(paths, name)?;
    let report = system_engine(paths).restore(&task)?;
    println!("{}", report.outcome());
    if !report.launched_anything() && report.failures.is_empty() {
        println!("Everything in '{task}' is already open.");
    }
    Ok(())
}

/// `fleck show [name]`
pub fn show(paths: &FleckPaths, name: Option<&str>) -> anyhow::Result<()> {
    let task = resolve_task(paths, name)?;
    let snapshot = SnapshotStore::new(paths)
        .load(&task)
        .ok_or_else(|| FleckError::SnapshotNotFound(task.clone()))?;
    print!("{}", format_snapshot(&snapshot));
    Ok(())
}

pub(crate) fn format_snapshot(snapshot: &WorkspaceSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Workspace '{}'", snapshot.task_name);
    match &snapshot.captured_at {
        Some(ts) => {
            let _ = writeln!(out, "Last saved: {}", short_time(ts));
        }
        None => {
            let _ = writeln!(out, "Last saved: never (run `fleck save`)");
        }
    }

    let _ = writeln!(out, "\nApplications ({})", snapshot.applications.len());
    for app in &snapshot.applications {
        let _ = writeln!(
            out,
            "  {:<24} {}",
            clip(&app.process_name, 24),
            clip(&app.window_title, 60)
        );
    }

    for (browser, tabs) in &snapshot.browser_tabs {
        let _ = writeln!(out, "\n{browser} tabs ({})", tabs.len());
        for tab in tabs {
            let _ = writeln!(out, "  {:<40} {}", clip(&tab.title, 40), tab.url);
        }
    }

    let _ = writeln!(out, "\nFolders ({})", snapshot.explorer_folders.len());
    for folder in &snapshot.explorer_folders {
        let _ = writeln!(
            out,
            "  {:<24} {}",
            clip(&folder.display_name, 24),
            folder.folder_path
        );
    }
    out
}

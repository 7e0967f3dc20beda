use fleck_core::Outcome;
use fleck_store::FleckPaths;
use fleck_tasks::TaskRegistry;

/// `fleck doctor [--dry-run]`
pub fn execute(paths: &FleckPaths, dry_run: bool) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    let actions = registry.repair(!dry_run)?;
    if actions.is_empty() {
        println!("{}", Outcome::ok("Todos and timers are consistent"));
        return Ok(());
    }

    let prefix = if dry_run { "[dry-run] would " } else { "" };
    for action in &actions {
        println!("  {prefix}{action}");
    }
    if dry_run {
        println!("\n{} problem(s) found. Run without --dry-run to fix.", actions.len());
    } else {
        println!("{}", Outcome::ok(format!("Fixed {} problem(s)", actions.len())));
    }
    Ok(())
}

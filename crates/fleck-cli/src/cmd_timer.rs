use fleck_core::{format_duration, Status};
use fleck_store::{FleckConfig, FleckPaths};
use fleck_tasks::TaskRegistry;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_millis(100);

/// `fleck timer <id>`
///
/// Promotes a ToDo item to InProgress, then redraws the elapsed time until
/// Ctrl+C. Other commands may pause or finish the todo meanwhile; the view
/// only reads the timer store.
pub fn execute(paths: &FleckPaths, todo_id: &str) -> anyhow::Result<()> {
    let registry = TaskRegistry::new(paths);
    let ctx = registry.context();
    let task = ctx.require_task()?.to_string();

    let todo = registry.begin_timing(&ctx, todo_id)?;
    if todo.status == Status::Done {
        println!(
            "Todo #{todo_id} is already done. Total time: {}",
            format_duration(todo.time_spent.unwrap_or(0.0))
        );
        return Ok(());
    }

    let poll = Duration::from_secs(FleckConfig::load(paths).timer_poll_secs.max(1));
    let cancel = CancellationToken::new();
    ctrlc_cancel(cancel.clone());

    println!("Timer for task '{task}', todo #{todo_id}: {}", todo.description);
    println!("Press Ctrl+C to leave the timer view.");
    let mut stdout = std::io::stdout();
    while !cancel.is_cancelled() {
        let status = registry.timers().query(&task, todo_id);
        let label = if status.is_running {
            "Elapsed"
        } else {
            "Paused "
        };
        print!("\r{label}: {}   ", status.formatted);
        stdout.flush()?;
        sleep_or_cancel(&cancel, poll);
    }
    println!("\nLeft timer view. The timer keeps its state.");
    Ok(())
}

/// Cancel `cancel` on Ctrl+C.
pub(crate) fn ctrlc_cancel(cancel: CancellationToken) {
    let _ = ctrlc::set_handler(move || {
        cancel.cancel();
    });
}

/// Sleep for `total`, waking early once `cancel` fires.
pub(crate) fn sleep_or_cancel(cancel: &CancellationToken, total: Duration) {
    let deadline = Instant::now() + total;
    while !cancel.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(TICK.min(deadline - now));
    }
}

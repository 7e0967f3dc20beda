use crate::cmd_snapshot::{resolve_task, system_engine};
use crate::cmd_timer::{ctrlc_cancel, sleep_or_cancel};
use fleck_core::Outcome;
use fleck_store::{FleckConfig, FleckPaths};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `fleck track [--interval secs]`
///
/// Re-captures the active workspace until Ctrl+C. A failed capture is
/// reported and retried on the next tick.
pub fn execute(paths: &FleckPaths, interval: Option<u64>) -> anyhow::Result<()> {
    let task = resolve_task(paths, None)?;
    let every = interval
        .unwrap_or_else(|| FleckConfig::load(paths).track_interval_secs)
        .max(1);
    let engine = system_engine(paths);

    let cancel = CancellationToken::new();
    ctrlc_cancel(cancel.clone());

    println!("Tracking workspace '{task}' every {every}s. Press Ctrl+C to stop.");
    let mut captures = 0u64;
    while !cancel.is_cancelled() {
        match engine.capture(&task) {
            Ok(snapshot) => {
                captures += 1;
                let summary = snapshot.summary();
                tracing::info!(
                    task = %task,
                    apps = summary.app_count,
                    tabs = summary.total_tabs(),
                    folders = summary.folder_count,
                    "workspace tracked"
                );
            }
            Err(err) => eprintln!("{}", Outcome::from(&err)),
        }
        sleep_or_cancel(&cancel, Duration::from_secs(every));
    }
    println!("Tracking stopped after {captures} capture(s).");
    Ok(())
}

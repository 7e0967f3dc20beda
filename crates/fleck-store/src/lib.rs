use anyhow::Context;
use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod config;
pub mod document;
pub mod paths;
pub mod pointer;
pub mod snapshots;
pub mod timers;
pub mod todos;

pub use config::{BrowserSpec, FleckConfig};
pub use document::JsonDocument;
pub use paths::FleckPaths;
pub use pointer::PointerStore;
pub use snapshots::SnapshotStore;
pub use timers::{split_key, TimerMap, TimerStore};
pub use todos::{TodoDocument, TodoStore};

/// Environment variable that relocates the whole data directory.
pub const HOME_ENV: &str = "FLECK_HOME";

/// Return the per-user data root: `$FLECK_HOME`, else `<data_dir>/fleck/Data`.
/// Falls back to `~/.fleck/Data`, then `./.fleck-data`.
pub fn store_root() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        PathBuf::from(home)
    } else if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("fleck").join("Data")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".fleck").join("Data")
    } else {
        PathBuf::from(".fleck-data")
    }
}

/// Replace a store file in one step so readers see either the old or the
/// new document. Parent directories are created on first use.
pub fn replace_file(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => anyhow::bail!("store file {} has no directory", path.display()),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create store directory {}", dir.display()))?;
    let mut staged = tempfile::Builder::new()
        .prefix(".fleck-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .with_context(|| format!("cannot stage {}", path.display()))?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged
        .persist(path)
        .with_context(|| format!("cannot replace {}", path.display()))?;
    Ok(())
}

/// Exclusive advisory lock on a `.lock` sibling of a store file, held
/// until dropped.
#[derive(Debug)]
pub struct StoreLock {
    _file: fs::File,
}

impl StoreLock {
    /// Block until the lock is ours.
    pub fn acquire(lock_path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = lock_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)
            .with_context(|| format!("cannot open store lock {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("cannot lock {}", lock_path.display()))?;
        Ok(Self { _file: file })
    }
}

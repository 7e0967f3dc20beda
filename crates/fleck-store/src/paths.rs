use fleck_core::RESERVED_POINTER_NAME;
use std::path::{Path, PathBuf};

/// All well-known paths under the data directory.
#[derive(Debug, Clone)]
pub struct FleckPaths {
    pub root: PathBuf,
    pub sessions_dir: PathBuf,
    pub current_session_json: PathBuf,
    pub todos_json: PathBuf,
    pub timers_json: PathBuf,
    pub config_json: PathBuf,
    pub logs_dir: PathBuf,
}

impl FleckPaths {
    /// Derive all paths from a data root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let sessions_dir = root.join("sessions");
        Self {
            current_session_json: sessions_dir.join(format!("{RESERVED_POINTER_NAME}.json")),
            todos_json: root.join("todos.json"),
            timers_json: root.join("timers.json"),
            config_json: root.join("config.json"),
            logs_dir: root.join("logs"),
            sessions_dir,
            root,
        }
    }

    /// Paths under [`crate::store_root`].
    pub fn from_env() -> Self {
        Self::discover(crate::store_root())
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [&self.root, &self.sessions_dir, &self.logs_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// `sessions/<task>.json`
    pub fn snapshot_file(&self, task: &str) -> PathBuf {
        self.sessions_dir.join(format!("{task}.json"))
    }

    /// Sibling lock file used to serialize writers of `path`.
    pub fn lock_path_for(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "store".to_string());
        path.with_file_name(format!("{name}.lock"))
    }
}

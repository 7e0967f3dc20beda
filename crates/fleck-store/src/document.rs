use crate::paths::FleckPaths;
use crate::{replace_file, StoreLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// One whole-document JSON file.
///
/// Reads are lock-free and forgiving: a missing file or one that does not
/// parse yields `T::default()`. Writers go through [`JsonDocument::update`],
/// which serializes read-modify-write cycles across processes with an
/// advisory lock and replaces the file atomically.
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    lock_path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = FleckPaths::lock_path_for(&path);
        Self {
            path,
            lock_path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, falling back to the default on any failure.
    pub fn load(&self) -> T {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable store, using defaults");
                return T::default();
            }
        };
        if content.trim().is_empty() {
            return T::default();
        }
        match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt store, using defaults");
                T::default()
            }
        }
    }

    /// Overwrite the document without taking the lock.
    /// Callers that read first must use [`JsonDocument::update`] instead.
    pub fn save(&self, doc: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(doc)?;
        replace_file(&self.path, json.as_bytes())
    }

    /// Locked read-modify-write. `f` sees the latest on-disk state; the
    /// document is written back only when `f` succeeds.
    pub fn update<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<anyhow::Error>,
    {
        let _lock = StoreLock::acquire(&self.lock_path)?;
        let mut doc = self.load();
        let out = f(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    type Counters = BTreeMap<String, u64>;

    #[test]
    fn missing_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Counters> = JsonDocument::new(tmp.path().join("c.json"));
        assert!(doc.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("c.json");
        std::fs::write(&path, "{ not json").unwrap();
        let doc: JsonDocument<Counters> = JsonDocument::new(&path);
        assert!(doc.load().is_empty());

        // and the next update heals it
        doc.update(|m| {
            m.insert("a".into(), 1);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
        assert_eq!(doc.load().get("a"), Some(&1));
    }

    #[test]
    fn failed_update_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Counters> = JsonDocument::new(tmp.path().join("c.json"));
        let res: anyhow::Result<()> = doc.update(|m| {
            m.insert("a".into(), 1);
            anyhow::bail!("refused")
        });
        assert!(res.is_err());
        assert!(!doc.path().exists());
    }

    #[test]
    fn concurrent_updates_do_not_lose_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("c.json");
        let doc: Arc<JsonDocument<Counters>> = Arc::new(JsonDocument::new(&path));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let doc = Arc::clone(&doc);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        doc.update(|m| {
                            *m.entry("hits".into()).or_insert(0) += 1;
                            Ok::<_, anyhow::Error>(())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(doc.load().get("hits"), Some(&200));
    }
}

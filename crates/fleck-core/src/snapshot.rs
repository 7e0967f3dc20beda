use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// File stem of the current-workspace pointer inside `sessions/`.
/// No task may use this name.
pub const RESERVED_POINTER_NAME: &str = "current_session";

/// Seconds between 1601-01-01 (WebKit epoch) and 1970-01-01.
const WEBKIT_EPOCH_OFFSET: f64 = 11_644_473_600.0;

/// Per-browser tab keys written by older snapshot files, with the browser
/// id each one maps to.
const LEGACY_TAB_KEYS: [(&str, &str); 3] = [
    ("chrome_tabs", "chrome"),
    ("brave_tabs", "brave"),
    ("edge_tabs", "msedge"),
];

/// Microseconds since 1601 to Unix seconds. Unset times map to 0.
pub fn webkit_to_unix(micros: i64) -> f64 {
    if micros <= 0 {
        return 0.0;
    }
    (micros as f64 / 1_000_000.0 - WEBKIT_EPOCH_OFFSET).max(0.0)
}

/// Reads JSON `null` as the type's default.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// A running, visibly windowed application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppEntry {
    #[serde(rename = "name", default, deserialize_with = "null_as_default")]
    pub process_name: String,
    #[serde(rename = "title", default, deserialize_with = "null_as_default")]
    pub window_title: String,
    /// Empty when the process path could not be read (elevated processes).
    #[serde(rename = "path", default, deserialize_with = "null_as_default")]
    pub executable_path: String,
}

/// An open file-explorer folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderEntry {
    #[serde(rename = "title", default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(rename = "path", default, deserialize_with = "null_as_default")]
    pub folder_path: String,
}

/// A recently visited browser page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "TabFile")]
pub struct BrowserTab {
    pub title: String,
    pub url: String,
    /// Visit time as Unix epoch seconds.
    pub visited_at: f64,
}

/// On-disk tab. Older files carry the raw WebKit `timestamp` instead of
/// `visited_at`.
#[derive(Deserialize)]
struct TabFile {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    url: String,
    #[serde(default)]
    visited_at: Option<f64>,
    #[serde(default)]
    timestamp: Option<i64>,
}

impl From<TabFile> for BrowserTab {
    fn from(raw: TabFile) -> Self {
        let visited_at = raw
            .visited_at
            .or_else(|| raw.timestamp.map(webkit_to_unix))
            .unwrap_or(0.0);
        Self {
            title: raw.title,
            url: raw.url,
            visited_at,
        }
    }
}

/// Captured desktop state for one task (`sessions/<task>.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "SnapshotFile")]
pub struct WorkspaceSnapshot {
    pub task_name: String,
    /// RFC 3339 capture time; `None` for the empty placeholder written at
    /// task creation.
    #[serde(rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
    pub applications: Vec<AppEntry>,
    #[serde(rename = "explorer")]
    pub explorer_folders: Vec<FolderEntry>,
    /// browser id → tabs, most recent first.
    pub browser_tabs: BTreeMap<String, Vec<BrowserTab>>,
}

#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default, deserialize_with = "null_as_default")]
    task_name: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    applications: Vec<AppEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    explorer: Vec<FolderEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    browser_tabs: BTreeMap<String, Vec<BrowserTab>>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl From<SnapshotFile> for WorkspaceSnapshot {
    fn from(mut raw: SnapshotFile) -> Self {
        for (key, browser_id) in LEGACY_TAB_KEYS {
            let Some(value) = raw.rest.remove(key) else {
                continue;
            };
            let tabs: Vec<BrowserTab> = serde_json::from_value(value).unwrap_or_default();
            if !tabs.is_empty() {
                raw.browser_tabs.entry(browser_id.to_string()).or_insert(tabs);
            }
        }
        Self {
            task_name: raw.task_name,
            captured_at: raw.timestamp,
            applications: raw.applications,
            explorer_folders: raw.explorer,
            browser_tabs: raw.browser_tabs,
        }
    }
}

impl WorkspaceSnapshot {
    /// Empty snapshot written when a task is created.
    pub fn placeholder(task_name: &str) -> Self {
        Self {
            task_name: task_name.to_string(),
            ..Default::default()
        }
    }

    pub fn tabs_for(&self, browser_id: &str) -> &[BrowserTab] {
        self.browser_tabs
            .get(browser_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            task_name: self.task_name.clone(),
            captured_at: self.captured_at.clone(),
            app_count: self.applications.len(),
            tab_counts: self
                .browser_tabs
                .iter()
                .map(|(browser, tabs)| (browser.clone(), tabs.len()))
                .collect(),
            folder_count: self.explorer_folders.len(),
        }
    }
}

/// Counts shown in the task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub task_name: String,
    pub captured_at: Option<String>,
    pub app_count: usize,
    pub tab_counts: BTreeMap<String, usize>,
    pub folder_count: usize,
}

impl SnapshotSummary {
    pub fn total_tabs(&self) -> usize {
        self.tab_counts.values().sum()
    }
}

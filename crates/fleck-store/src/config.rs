use crate::document::JsonDocument;
use crate::paths::FleckPaths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

type RawConfig = serde_json::Map<String, serde_json::Value>;

/// A browser whose tabs are captured and restored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrowserSpec {
    /// Key used in snapshots (`chrome`, `brave`, `msedge`).
    pub id: String,
    /// Process name that identifies the browser among running applications.
    pub process_name: String,
    /// Program and leading arguments; URLs are appended.
    pub launch_command: Vec<String>,
    /// Chromium `History` database of the default profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,
}

/// Settings read from `config.json`; every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FleckConfig {
    /// Process names never captured (shell and system hosts).
    pub denylist: Vec<String>,
    /// Executable path prefixes never captured.
    pub excluded_path_prefixes: Vec<String>,
    pub browsers: Vec<BrowserSpec>,
    /// Most recent history entries sampled per browser.
    pub tab_limit: usize,
    /// Refresh interval of the live timer display.
    pub timer_poll_secs: u64,
    /// Capture interval of `fleck track`.
    pub track_interval_secs: u64,
    /// Launch command for built-in applications that report no executable
    /// path, keyed by lowercase window title or process name.
    pub system_apps: BTreeMap<String, String>,
}

impl Default for FleckConfig {
    fn default() -> Self {
        Self {
            denylist: [
                "TextInputHost",
                "ShellExperienceHost",
                "StartMenuExperienceHost",
                "ApplicationFrameHost",
                "RuntimeBroker",
                "SearchUI",
                "dllhost",
                "sihost",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded_path_prefixes: [
                "C:\\Windows\\SystemApps",
                "C:\\Windows\\ImmersiveControlPanel",
                "C:\\Windows\\WinSxS",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            browsers: default_browsers(),
            tab_limit: 20,
            timer_poll_secs: 1,
            track_interval_secs: 10,
            system_apps: default_system_apps(),
        }
    }
}

fn default_system_apps() -> BTreeMap<String, String> {
    [
        ("calculator", "calc.exe"),
        ("notepad", "notepad.exe"),
        ("paint", "mspaint.exe"),
        ("cmd", "cmd.exe"),
        ("powershell", "powershell.exe"),
        ("explorer", "explorer.exe"),
        ("control panel", "control.exe"),
        ("task manager", "taskmgr.exe"),
        ("regedit", "regedit.exe"),
        ("charmap", "charmap.exe"),
        ("wordpad", "write.exe"),
        ("snipping tool", "snippingtool.exe"),
        (
            "clock",
            "explorer.exe shell:AppsFolder\\Microsoft.WindowsAlarms_8wekyb3d8bbwe!App",
        ),
        (
            "photos",
            "explorer.exe shell:AppsFolder\\Microsoft.Windows.Photos_8wekyb3d8bbwe!App",
        ),
        ("settings", "ms-settings:"),
        ("store", "ms-windows-store:"),
        ("edge", "msedge.exe"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl FleckConfig {
    /// Load `config.json` layered over the defaults. A file that does not
    /// deserialize falls back to the defaults with a warning.
    pub fn load(paths: &FleckPaths) -> Self {
        let overrides = read_raw(paths);
        if overrides.is_empty() {
            return Self::default();
        }
        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => RawConfig::new(),
        };
        for (k, v) in overrides {
            merged.insert(k, v);
        }
        match serde_json::from_value(serde_json::Value::Object(merged)) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "invalid config.json, using defaults");
                Self::default()
            }
        }
    }

    pub fn browser(&self, id: &str) -> Option<&BrowserSpec> {
        self.browsers.iter().find(|b| b.id == id)
    }

    /// Launch command for an application without a recorded path. The
    /// window title is tried first, then the process name.
    pub fn system_command(&self, process_name: &str, window_title: &str) -> Option<&str> {
        [window_title, process_name]
            .iter()
            .find_map(|key| self.system_apps.get(&key.trim().to_lowercase()))
            .map(String::as_str)
    }

    /// Case-insensitive denylist check on process name and path prefix.
    pub fn is_excluded(&self, process_name: &str, executable_path: &str) -> bool {
        let name = process_name.to_lowercase();
        let path = executable_path.to_lowercase();
        self.denylist.iter().any(|d| d.to_lowercase() == name)
            || self
                .excluded_path_prefixes
                .iter()
                .any(|p| !path.is_empty() && path.starts_with(&p.to_lowercase()))
    }
}

// ── Raw key/value access for `fleck config` ──

/// Read `config.json` as a flat object. Returns an empty map if missing.
pub fn read_raw(paths: &FleckPaths) -> RawConfig {
    JsonDocument::<RawConfig>::new(&paths.config_json).load()
}

/// Set one key. The value is stored as parsed by [`parse_value`].
pub fn set_raw(paths: &FleckPaths, key: &str, value: &str) -> anyhow::Result<()> {
    JsonDocument::<RawConfig>::new(&paths.config_json).update(|cfg| {
        cfg.insert(key.to_string(), parse_value(value));
        Ok(())
    })
}

/// Remove one key. Returns whether it was set.
pub fn unset_raw(paths: &FleckPaths, key: &str) -> anyhow::Result<bool> {
    JsonDocument::<RawConfig>::new(&paths.config_json).update(|cfg| Ok(cfg.remove(key).is_some()))
}

/// Parse a string value into an appropriate JSON value
/// (bool/number/JSON array or object/string).
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else if s.starts_with('[') || s.starts_with('{') {
                serde_json::from_str(s)
                    .unwrap_or_else(|_| serde_json::Value::String(s.to_string()))
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

// ── Platform defaults ──

fn browser(id: &str, process_name: &str, launch: &[&str], profile: Option<PathBuf>) -> BrowserSpec {
    BrowserSpec {
        id: id.to_string(),
        process_name: process_name.to_string(),
        launch_command: launch.iter().map(|s| s.to_string()).collect(),
        history_path: profile.map(|p| p.join("Default").join("History")),
    }
}

#[cfg(windows)]
fn default_browsers() -> Vec<BrowserSpec> {
    let local = dirs::data_local_dir();
    let profile = |parts: &[&str]| {
        local
            .as_ref()
            .map(|l| parts.iter().fold(l.clone(), |acc, p| acc.join(p)))
    };
    vec![
        browser(
            "chrome",
            "chrome",
            &["cmd", "/C", "start", "", "chrome"],
            profile(&["Google", "Chrome", "User Data"]),
        ),
        browser(
            "brave",
            "brave",
            &["cmd", "/C", "start", "", "brave"],
            profile(&["BraveSoftware", "Brave-Browser", "User Data"]),
        ),
        browser(
            "msedge",
            "msedge",
            &["cmd", "/C", "start", "", "msedge"],
            profile(&["Microsoft", "Edge", "User Data"]),
        ),
    ]
}

#[cfg(target_os = "macos")]
fn default_browsers() -> Vec<BrowserSpec> {
    let support = dirs::data_dir();
    let profile = |parts: &[&str]| {
        support
            .as_ref()
            .map(|l| parts.iter().fold(l.clone(), |acc, p| acc.join(p)))
    };
    vec![
        browser(
            "chrome",
            "Google Chrome",
            &["open", "-a", "Google Chrome"],
            profile(&["Google", "Chrome"]),
        ),
        browser(
            "brave",
            "Brave Browser",
            &["open", "-a", "Brave Browser"],
            profile(&["BraveSoftware", "Brave-Browser"]),
        ),
        browser(
            "msedge",
            "Microsoft Edge",
            &["open", "-a", "Microsoft Edge"],
            profile(&["Microsoft Edge"]),
        ),
    ]
}

#[cfg(not(any(windows, target_os = "macos")))]
fn default_browsers() -> Vec<BrowserSpec> {
    let config = dirs::config_dir();
    let profile = |parts: &[&str]| {
        config
            .as_ref()
            .map(|l| parts.iter().fold(l.clone(), |acc, p| acc.join(p)))
    };
    vec![
        browser(
            "chrome",
            "chrome",
            &["google-chrome"],
            profile(&["google-chrome"]),
        ),
        browser(
            "brave",
            "brave",
            &["brave-browser"],
            profile(&["BraveSoftware", "Brave-Browser"]),
        ),
        browser(
            "msedge",
            "msedge",
            &["microsoft-edge"],
            profile(&["microsoft-edge"]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = FleckConfig::load(&FleckPaths::discover(tmp.path()));
        assert_eq!(cfg, FleckConfig::default());
        assert_eq!(cfg.tab_limit, 20);
        assert!(cfg.browser("chrome").is_some());
    }

    #[test]
    fn overrides_are_layered_on_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = FleckPaths::discover(tmp.path());
        set_raw(&paths, "tab_limit", "5").unwrap();
        set_raw(&paths, "denylist", r#"["slack"]"#).unwrap();
        set_raw(&paths, "unrelated", "kept").unwrap();

        let cfg = FleckConfig::load(&paths);
        assert_eq!(cfg.tab_limit, 5);
        assert_eq!(cfg.denylist, vec!["slack".to_string()]);
        assert_eq!(cfg.timer_poll_secs, 1);
        assert_eq!(read_raw(&paths).get("unrelated").unwrap(), "kept");
    }

    #[test]
    fn bad_value_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = FleckPaths::discover(tmp.path());
        set_raw(&paths, "tab_limit", "lots").unwrap();
        assert_eq!(FleckConfig::load(&paths), FleckConfig::default());
    }

    #[test]
    fn unset_removes_key() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = FleckPaths::discover(tmp.path());
        set_raw(&paths, "tab_limit", "5").unwrap();
        assert!(unset_raw(&paths, "tab_limit").unwrap());
        assert!(!unset_raw(&paths, "tab_limit").unwrap());
        assert_eq!(FleckConfig::load(&paths).tab_limit, 20);
    }

    #[test]
    fn system_apps_resolve_by_title_then_process() {
        let cfg = FleckConfig::default();
        assert_eq!(cfg.system_command("CalculatorApp", "Calculator"), Some("calc.exe"));
        assert_eq!(cfg.system_command("notepad", "todo.txt - Notepad"), Some("notepad.exe"));
        assert_eq!(cfg.system_command("Code", "main.rs"), None);
        assert!(cfg.system_command("x", "Clock").unwrap().starts_with("explorer.exe shell:"));
    }

    #[test]
    fn system_apps_can_be_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = FleckPaths::discover(tmp.path());
        set_raw(&paths, "system_apps", r#"{"mail":"olk.exe"}"#).unwrap();
        let cfg = FleckConfig::load(&paths);
        assert_eq!(cfg.system_command("olk", "Mail"), Some("olk.exe"));
        assert_eq!(cfg.system_command("x", "Calculator"), None);
    }

    #[test]
    fn parse_value_types() {
        assert_eq!(parse_value("true"), serde_json::Value::Bool(true));
        assert_eq!(parse_value("42"), serde_json::json!(42));
        assert_eq!(parse_value("1.5"), serde_json::json!(1.5));
        assert_eq!(parse_value("[1,2]"), serde_json::json!([1, 2]));
        assert_eq!(parse_value("[oops"), serde_json::json!("[oops"));
        assert_eq!(parse_value("chrome"), serde_json::json!("chrome"));
    }

    #[test]
    fn exclusion_is_case_insensitive() {
        let cfg = FleckConfig::default();
        assert!(cfg.is_excluded("RUNTIMEBROKER", "C:\\x.exe"));
        assert!(cfg.is_excluded(
            "calc",
            "c:\\windows\\systemapps\\calc\\calc.exe"
        ));
        assert!(!cfg.is_excluded("Code", "C:\\VS Code\\Code.exe"));
        assert!(!cfg.is_excluded("Code", ""));
    }
}

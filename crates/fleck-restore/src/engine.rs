use crate::matcher::{DefaultMatcher, PresenceMatcher};
use crate::provider::{BrowserTabProvider, InventoryProvider, Launcher};
use fleck_core::{
    now_rfc3339, validate_task_name, AppEntry, FleckError, Outcome, Result, WorkspaceSnapshot,
};
use fleck_store::{BrowserSpec, FleckConfig, FleckPaths, SnapshotStore};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Saves the desktop into a task's snapshot and brings it back.
pub struct RestoreEngine {
    snapshots: SnapshotStore,
    config: FleckConfig,
    inventory: Arc<dyn InventoryProvider>,
    tabs: Arc<dyn BrowserTabProvider>,
    launcher: Arc<dyn Launcher>,
    matcher: Arc<dyn PresenceMatcher>,
}

/// What a restore did. Items already present are skipped, not failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub task_name: String,
    pub launched_apps: Vec<String>,
    pub skipped_apps: Vec<String>,
    /// browser id → number of URLs opened
    pub opened_tabs: BTreeMap<String, usize>,
    pub opened_folders: Vec<String>,
    pub skipped_folders: Vec<String>,
    /// `item: error` for every launch that failed.
    pub failures: Vec<String>,
}

impl RestoreReport {
    pub fn launched_anything(&self) -> bool {
        !self.launched_apps.is_empty()
            || !self.opened_tabs.is_empty()
            || !self.opened_folders.is_empty()
    }

    /// Overall result. Failed launches are reported in the message but do
    /// not make the restore unsuccessful.
    pub fn outcome(&self) -> Outcome {
        let tabs: usize = self.opened_tabs.values().sum();
        let mut message = format!(
            "Session restored for task: {} ({} apps, {} tabs, {} folders opened; {} already open)",
            self.task_name,
            self.launched_apps.len(),
            tabs,
            self.opened_folders.len(),
            self.skipped_apps.len() + self.skipped_folders.len(),
        );
        if !self.failures.is_empty() {
            message.push_str(&format!(
                "; {} failed: {}",
                self.failures.len(),
                self.failures.join(", ")
            ));
        }
        Outcome::ok(message)
    }
}

impl RestoreEngine {
    pub fn new(
        paths: &FleckPaths,
        config: FleckConfig,
        inventory: Arc<dyn InventoryProvider>,
        tabs: Arc<dyn BrowserTabProvider>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            snapshots: SnapshotStore::new(paths),
            config,
            inventory,
            tabs,
            launcher,
            matcher: Arc::new(DefaultMatcher),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn PresenceMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    fn browser_for(&self, app: &AppEntry) -> Option<&BrowserSpec> {
        self.config
            .browsers
            .iter()
            .find(|b| b.process_name.eq_ignore_ascii_case(&app.process_name))
    }

    /// Fill an empty executable path from the configured system apps.
    fn with_system_command(&self, mut app: AppEntry) -> AppEntry {
        if app.executable_path.is_empty() {
            if let Some(cmd) = self
                .config
                .system_command(&app.process_name, &app.window_title)
            {
                app.executable_path = cmd.to_string();
            }
        }
        app
    }

    /// Record the current desktop as `task`'s snapshot, replacing any
    /// earlier one.
    ///
    /// Browser history is read only for browsers that are among the captured
    /// applications. Folder and tab lookups that fail are logged and leave
    /// their part of the snapshot empty; a failed application listing aborts
    /// the capture so a good snapshot is never replaced by an empty one.
    pub fn capture(&self, task: &str) -> Result<WorkspaceSnapshot> {
        validate_task_name(task)?;
        let applications: Vec<AppEntry> = self
            .inventory
            .running_applications()
            .map_err(|e| FleckError::ExternalTool(format!("listing applications: {e}")))?
            .into_iter()
            .map(|app| self.with_system_command(app))
            .filter(|app| !self.config.is_excluded(&app.process_name, &app.executable_path))
            .collect();

        let explorer_folders = self.inventory.open_folders().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cannot list open folders");
            Vec::new()
        });

        let mut browser_tabs = BTreeMap::new();
        for browser in &self.config.browsers {
            let present = applications
                .iter()
                .any(|app| app.process_name.eq_ignore_ascii_case(&browser.process_name));
            if !present {
                continue;
            }
            match self.tabs.recent_tabs(browser, task) {
                Ok(mut tabs) => {
                    tabs.truncate(self.config.tab_limit);
                    browser_tabs.insert(browser.id.clone(), tabs);
                }
                Err(e) => {
                    tracing::warn!(browser = %browser.id, error = %e, "cannot read browser history");
                }
            }
        }

        let snapshot = WorkspaceSnapshot {
            task_name: task.to_string(),
            captured_at: Some(now_rfc3339()),
            applications,
            explorer_folders,
            browser_tabs,
        };
        self.snapshots.save(&snapshot)?;
        tracing::info!(
            task,
            apps = snapshot.applications.len(),
            folders = snapshot.explorer_folders.len(),
            "workspace captured"
        );
        Ok(snapshot)
    }

    /// Bring back `task`'s snapshot, launching only what is not already open.
    ///
    /// An application listing that fails is logged and treated as nothing
    /// running.
    pub fn restore(&self, task: &str) -> Result<RestoreReport> {
        validate_task_name(task)?;
        let snapshot = self
            .snapshots
            .load(task)
            .ok_or_else(|| FleckError::SnapshotNotFound(task.to_string()))?;
        let running: Vec<AppEntry> = match self.inventory.running_applications() {
            Ok(apps) => apps
                .into_iter()
                .map(|app| self.with_system_command(app))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "cannot list running applications, launching everything");
                Vec::new()
            }
        };
        let titles = self.inventory.window_titles().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cannot list window titles");
            Vec::new()
        });

        let mut report = RestoreReport {
            task_name: task.to_string(),
            ..Default::default()
        };
        let mut seen_paths = HashSet::new();

        let applications: Vec<AppEntry> = snapshot
            .applications
            .iter()
            .cloned()
            .map(|app| self.with_system_command(app))
            .collect();
        for app in &applications {
            if app.executable_path.is_empty() {
                tracing::debug!(app = %app.process_name, "no executable path recorded");
                continue;
            }
            if !seen_paths.insert(app.executable_path.to_lowercase()) {
                continue;
            }
            if self.matcher.is_app_running(app, &running) {
                tracing::info!(path = %app.executable_path, "already running, skipped");
                report.skipped_apps.push(app.process_name.clone());
                continue;
            }
            match self.launcher.launch_application(app) {
                Ok(()) => report.launched_apps.push(app.process_name.clone()),
                Err(e) => {
                    tracing::warn!(app = %app.process_name, error = %e, "launch failed");
                    report.failures.push(format!("{}: {e}", app.process_name));
                }
            }

            let Some(browser) = self.browser_for(app) else {
                continue;
            };
            let urls: Vec<String> = snapshot
                .tabs_for(&browser.id)
                .iter()
                .filter(|tab| !tab.url.is_empty())
                .map(|tab| tab.url.clone())
                .collect();
            if urls.is_empty() {
                continue;
            }
            match self.launcher.launch_browser_tabs(browser, &urls) {
                Ok(()) => {
                    report.opened_tabs.insert(browser.id.clone(), urls.len());
                }
                Err(e) => {
                    tracing::warn!(browser = %browser.id, error = %e, "opening tabs failed");
                    report.failures.push(format!("{} tabs: {e}", browser.id));
                }
            }
        }

        for folder in &snapshot.explorer_folders {
            if folder.folder_path.is_empty() {
                continue;
            }
            if self.matcher.is_folder_open(folder, &titles) {
                tracing::info!(path = %folder.folder_path, "folder already open, skipped");
                report.skipped_folders.push(folder.folder_path.clone());
                continue;
            }
            match self.launcher.launch_folder(&folder.folder_path) {
                Ok(()) => report.opened_folders.push(folder.folder_path.clone()),
                Err(e) => {
                    tracing::warn!(path = %folder.folder_path, error = %e, "opening folder failed");
                    report
                        .failures
                        .push(format!("{}: {e}", folder.folder_path));
                }
            }
        }

        tracing::info!(
            task,
            launched = report.launched_apps.len(),
            failed = report.failures.len(),
            "workspace restored"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::folder_base_name;
    use fleck_core::{BrowserTab, FolderEntry};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Launch {
        App(String),
        Tabs(String, Vec<String>),
        Folder(String),
    }

    /// In-memory desktop: launches show up in later inventory queries.
    #[derive(Default)]
    struct FakeDesktop {
        apps: Mutex<Vec<AppEntry>>,
        folders: Mutex<Vec<FolderEntry>>,
        titles: Mutex<Vec<String>>,
        tabs: Mutex<BTreeMap<String, Vec<BrowserTab>>>,
        launches: Mutex<Vec<Launch>>,
        history_reads: Mutex<Vec<String>>,
        fail_paths: Mutex<Vec<String>>,
        inventory_down: Mutex<bool>,
    }

    impl FakeDesktop {
        fn launches(&self) -> Vec<Launch> {
            self.launches.lock().unwrap().clone()
        }
    }

    impl InventoryProvider for FakeDesktop {
        fn running_applications(&self) -> anyhow::Result<Vec<AppEntry>> {
            if *self.inventory_down.lock().unwrap() {
                anyhow::bail!("powershell exited with status 1");
            }
            Ok(self.apps.lock().unwrap().clone())
        }
        fn open_folders(&self) -> anyhow::Result<Vec<FolderEntry>> {
            Ok(self.folders.lock().unwrap().clone())
        }
        fn window_titles(&self) -> anyhow::Result<Vec<String>> {
            Ok(self.titles.lock().unwrap().clone())
        }
    }

    impl BrowserTabProvider for FakeDesktop {
        fn recent_tabs(&self, browser: &BrowserSpec, _task: &str) -> anyhow::Result<Vec<BrowserTab>> {
            self.history_reads.lock().unwrap().push(browser.id.clone());
            Ok(self
                .tabs
                .lock()
                .unwrap()
                .get(&browser.id)
                .cloned()
                .unwrap_or_default())
        }
    }

    impl Launcher for FakeDesktop {
        fn launch_application(&self, app: &AppEntry) -> anyhow::Result<()> {
            if self.fail_paths.lock().unwrap().contains(&app.executable_path) {
                anyhow::bail!("not installed");
            }
            self.launches
                .lock()
                .unwrap()
                .push(Launch::App(app.executable_path.clone()));
            self.apps.lock().unwrap().push(app.clone());
            Ok(())
        }
        fn launch_browser_tabs(&self, browser: &BrowserSpec, urls: &[String]) -> anyhow::Result<()> {
            self.launches
                .lock()
                .unwrap()
                .push(Launch::Tabs(browser.id.clone(), urls.to_vec()));
            Ok(())
        }
        fn launch_folder(&self, folder_path: &str) -> anyhow::Result<()> {
            self.launches
                .lock()
                .unwrap()
                .push(Launch::Folder(folder_path.to_string()));
            self.titles
                .lock()
                .unwrap()
                .push(folder_base_name(folder_path).to_string());
            Ok(())
        }
    }

    fn app(name: &str, path: &str) -> AppEntry {
        AppEntry {
            process_name: name.into(),
            window_title: format!("{name} window"),
            executable_path: path.into(),
        }
    }

    fn tab(title: &str, url: &str) -> BrowserTab {
        BrowserTab {
            title: title.into(),
            url: url.into(),
            visited_at: 1_700_000_000.0,
        }
    }

    fn config() -> FleckConfig {
        FleckConfig {
            browsers: vec![BrowserSpec {
                id: "chrome".into(),
                process_name: "chrome".into(),
                launch_command: vec!["google-chrome".into()],
                history_path: None,
            }],
            ..FleckConfig::default()
        }
    }

    fn engine(tmp: &tempfile::TempDir, desktop: &Arc<FakeDesktop>) -> RestoreEngine {
        RestoreEngine::new(
            &FleckPaths::discover(tmp.path()),
            config(),
            desktop.clone(),
            desktop.clone(),
            desktop.clone(),
        )
    }

    fn snapshot() -> WorkspaceSnapshot {
        let mut tabs = BTreeMap::new();
        tabs.insert(
            "chrome".to_string(),
            vec![tab("Docs", "https://docs.rs"), tab("Crates", "https://crates.io")],
        );
        WorkspaceSnapshot {
            task_name: "writing".into(),
            captured_at: Some("2026-01-01T00:00:00Z".into()),
            applications: vec![
                app("Code", "/usr/bin/code"),
                app("chrome", "/opt/google/chrome/chrome"),
            ],
            explorer_folders: vec![FolderEntry {
                display_name: "drafts".into(),
                folder_path: "/home/me/drafts".into(),
            }],
            browser_tabs: tabs,
        }
    }

    #[test]
    fn capture_filters_denylist_and_samples_present_browsers_only() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.apps.lock().unwrap() = vec![
            app("Code", "/usr/bin/code"),
            app("RuntimeBroker", "C:\\Windows\\System32\\RuntimeBroker.exe"),
            app("chrome", "/opt/google/chrome/chrome"),
        ];
        desktop
            .tabs
            .lock()
            .unwrap()
            .insert("chrome".into(), vec![tab("Docs", "https://docs.rs")]);

        let snap = engine(&tmp, &desktop).capture("writing").unwrap();
        let names: Vec<&str> = snap
            .applications
            .iter()
            .map(|a| a.process_name.as_str())
            .collect();
        assert_eq!(names, vec!["Code", "chrome"]);
        assert_eq!(snap.tabs_for("chrome").len(), 1);
        assert_eq!(*desktop.history_reads.lock().unwrap(), vec!["chrome".to_string()]);
    }

    #[test]
    fn capture_skips_history_of_absent_browser() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.apps.lock().unwrap() = vec![app("Code", "/usr/bin/code")];
        let snap = engine(&tmp, &desktop).capture("writing").unwrap();
        assert!(snap.browser_tabs.is_empty());
        assert!(desktop.history_reads.lock().unwrap().is_empty());
    }

    #[test]
    fn captured_snapshot_round_trips_through_store() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.apps.lock().unwrap() = snapshot().applications;
        *desktop.folders.lock().unwrap() = snapshot().explorer_folders;
        *desktop.tabs.lock().unwrap() = snapshot().browser_tabs;

        let eng = engine(&tmp, &desktop);
        let captured = eng.capture("writing").unwrap();
        let loaded = eng.snapshots().load("writing").unwrap();
        assert_eq!(loaded, captured);
        assert_eq!(loaded.applications, snapshot().applications);
        assert_eq!(loaded.explorer_folders, snapshot().explorer_folders);
        assert_eq!(loaded.browser_tabs, snapshot().browser_tabs);
    }

    #[test]
    fn restore_missing_snapshot_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        assert!(matches!(
            engine(&tmp, &desktop).restore("nope"),
            Err(FleckError::SnapshotNotFound(_))
        ));
    }

    #[test]
    fn restore_launches_missing_items_with_batched_tabs() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        let eng = engine(&tmp, &desktop);
        eng.snapshots().save(&snapshot()).unwrap();

        let report = eng.restore("writing").unwrap();
        assert_eq!(
            desktop.launches(),
            vec![
                Launch::App("/usr/bin/code".into()),
                Launch::App("/opt/google/chrome/chrome".into()),
                Launch::Tabs(
                    "chrome".into(),
                    vec!["https://docs.rs".into(), "https://crates.io".into()]
                ),
                Launch::Folder("/home/me/drafts".into()),
            ]
        );
        assert_eq!(report.opened_tabs.get("chrome"), Some(&2));
        assert!(report.outcome().success);
    }

    #[test]
    fn restore_twice_launches_nothing_the_second_time() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        let eng = engine(&tmp, &desktop);
        eng.snapshots().save(&snapshot()).unwrap();

        eng.restore("writing").unwrap();
        let before = desktop.launches().len();
        let second = eng.restore("writing").unwrap();
        assert_eq!(desktop.launches().len(), before);
        assert!(!second.launched_anything());
        assert_eq!(second.skipped_apps.len(), 2);
        assert_eq!(second.skipped_folders.len(), 1);
        assert!(second.outcome().success);
    }

    #[test]
    fn running_app_matched_case_insensitively_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.apps.lock().unwrap() = vec![app("Code", "/USR/BIN/CODE")];
        *desktop.titles.lock().unwrap() = vec!["Drafts - Files".into()];
        let eng = engine(&tmp, &desktop);
        eng.snapshots().save(&snapshot()).unwrap();

        let report = eng.restore("writing").unwrap();
        assert_eq!(report.skipped_apps, vec!["Code".to_string()]);
        assert_eq!(report.skipped_folders, vec!["/home/me/drafts".to_string()]);
        assert!(!desktop
            .launches()
            .contains(&Launch::App("/usr/bin/code".into())));
    }

    #[test]
    fn failed_launch_does_not_stop_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        desktop
            .fail_paths
            .lock()
            .unwrap()
            .push("/usr/bin/code".into());
        let eng = engine(&tmp, &desktop);
        eng.snapshots().save(&snapshot()).unwrap();

        let report = eng.restore("writing").unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.launched_apps, vec!["chrome".to_string()]);
        assert_eq!(report.opened_folders.len(), 1);
        let outcome = report.outcome();
        assert!(outcome.success);
        assert!(outcome.message.contains("1 failed"));
    }

    #[test]
    fn duplicate_paths_in_snapshot_launch_once() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        let eng = engine(&tmp, &desktop);
        let mut snap = snapshot();
        snap.applications.push(app("Code", "/usr/bin/code"));
        eng.snapshots().save(&snap).unwrap();

        eng.restore("writing").unwrap();
        let code_launches = desktop
            .launches()
            .into_iter()
            .filter(|l| *l == Launch::App("/usr/bin/code".into()))
            .count();
        assert_eq!(code_launches, 1);
    }

    struct NeverPresent;

    impl PresenceMatcher for NeverPresent {
        fn is_app_running(&self, _: &AppEntry, _: &[AppEntry]) -> bool {
            false
        }
        fn is_folder_open(&self, _: &FolderEntry, _: &[String]) -> bool {
            false
        }
    }

    #[test]
    fn matcher_is_pluggable() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.apps.lock().unwrap() = snapshot().applications;
        let eng = engine(&tmp, &desktop).with_matcher(Arc::new(NeverPresent));
        eng.snapshots().save(&snapshot()).unwrap();
        let report = eng.restore("writing").unwrap();
        assert_eq!(report.launched_apps.len(), 2);
    }

    #[test]
    fn running_browser_keeps_its_tabs() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.apps.lock().unwrap() = vec![app("chrome", "/opt/google/chrome/chrome")];
        let eng = engine(&tmp, &desktop);
        eng.snapshots().save(&snapshot()).unwrap();

        let report = eng.restore("writing").unwrap();
        assert_eq!(report.skipped_apps, vec!["chrome".to_string()]);
        assert!(report.opened_tabs.is_empty());
        assert!(!desktop
            .launches()
            .iter()
            .any(|l| matches!(l, Launch::Tabs(..))));
    }

    #[test]
    fn restore_without_inventory_launches_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.apps.lock().unwrap() = snapshot().applications;
        *desktop.inventory_down.lock().unwrap() = true;
        let eng = engine(&tmp, &desktop);
        eng.snapshots().save(&snapshot()).unwrap();

        let report = eng.restore("writing").unwrap();
        assert_eq!(report.launched_apps.len(), 2);
        assert_eq!(report.opened_tabs.get("chrome"), Some(&2));
        assert!(report.skipped_apps.is_empty());

        assert!(matches!(
            eng.capture("writing"),
            Err(FleckError::ExternalTool(_))
        ));
    }

    #[test]
    fn system_app_without_path_gets_configured_command() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        let calculator = AppEntry {
            process_name: "CalculatorApp".into(),
            window_title: "Calculator".into(),
            executable_path: String::new(),
        };
        *desktop.apps.lock().unwrap() = vec![calculator];
        let eng = engine(&tmp, &desktop);

        let snap = eng.capture("writing").unwrap();
        assert_eq!(snap.applications[0].executable_path, "calc.exe");

        let report = eng.restore("writing").unwrap();
        assert_eq!(report.skipped_apps, vec!["CalculatorApp".to_string()]);

        desktop.apps.lock().unwrap().clear();
        eng.restore("writing").unwrap();
        assert_eq!(desktop.launches(), vec![Launch::App("calc.exe".into())]);
    }

    #[test]
    fn path_like_task_names_are_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let desktop = Arc::new(FakeDesktop::default());
        let eng = engine(&tmp, &desktop);
        for name in ["../todos", "a/b"] {
            assert!(matches!(eng.capture(name), Err(FleckError::InvalidName(_))));
            assert!(matches!(eng.restore(name), Err(FleckError::InvalidName(_))));
        }
    }
}

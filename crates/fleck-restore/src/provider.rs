use fleck_core::{AppEntry, BrowserTab, FolderEntry};
use fleck_store::BrowserSpec;

/// What is currently open on the desktop.
pub trait InventoryProvider {
    /// Running processes that own a visible window.
    fn running_applications(&self) -> anyhow::Result<Vec<AppEntry>>;

    /// Folders open in the file manager.
    fn open_folders(&self) -> anyhow::Result<Vec<FolderEntry>>;

    /// Titles of all visible top-level windows.
    fn window_titles(&self) -> anyhow::Result<Vec<String>>;
}

/// Recently visited pages of one browser.
pub trait BrowserTabProvider {
    /// Most recent first. Only asked for browsers that are part of the
    /// captured workspace.
    fn recent_tabs(&self, browser: &BrowserSpec, task: &str) -> anyhow::Result<Vec<BrowserTab>>;
}

/// Starts applications, browser tabs, and folders.
pub trait Launcher {
    fn launch_application(&self, app: &AppEntry) -> anyhow::Result<()>;

    /// Open every URL with a single browser invocation.
    fn launch_browser_tabs(&self, browser: &BrowserSpec, urls: &[String]) -> anyhow::Result<()>;

    fn launch_folder(&self, folder_path: &str) -> anyhow::Result<()>;
}

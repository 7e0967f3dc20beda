use fleck_core::{AppEntry, FolderEntry};

/// Decides whether a recorded item is already present on the desktop.
///
/// Matching is approximate: two folders can share a base name and process
/// ids do not survive a reboot. Implementations only need to avoid obvious
/// duplicate launches.
pub trait PresenceMatcher {
    fn is_app_running(&self, recorded: &AppEntry, running: &[AppEntry]) -> bool;

    fn is_folder_open(&self, folder: &FolderEntry, window_titles: &[String]) -> bool;
}

/// Executable path equality and window-title substring matching, both
/// case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMatcher;

impl PresenceMatcher for DefaultMatcher {
    fn is_app_running(&self, recorded: &AppEntry, running: &[AppEntry]) -> bool {
        let path = recorded.executable_path.to_lowercase();
        if path.is_empty() {
            return false;
        }
        running
            .iter()
            .any(|app| app.executable_path.to_lowercase() == path)
    }

    fn is_folder_open(&self, folder: &FolderEntry, window_titles: &[String]) -> bool {
        let name = folder_base_name(&folder.folder_path).to_lowercase();
        if name.is_empty() {
            return false;
        }
        window_titles
            .iter()
            .any(|title| title.to_lowercase().contains(&name))
    }
}

/// Last component of a folder path, accepting both `/` and `\` separators.
pub fn folder_base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
}

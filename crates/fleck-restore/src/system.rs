//! Inventory and launcher backed by the running operating system.
//!
//! Windows is queried through PowerShell (`Get-Process` and the
//! `Shell.Application` COM object). Other platforms use `wmctrl -lp` for the
//! window list and `sysinfo` to resolve each window's process.

use crate::provider::{InventoryProvider, Launcher};
use anyhow::{anyhow, bail};
use fleck_core::{AppEntry, FolderEntry};
use fleck_store::BrowserSpec;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInventory;

impl InventoryProvider for SystemInventory {
    fn running_applications(&self) -> anyhow::Result<Vec<AppEntry>> {
        platform::running_applications()
    }

    fn open_folders(&self) -> anyhow::Result<Vec<FolderEntry>> {
        platform::open_folders()
    }

    fn window_titles(&self) -> anyhow::Result<Vec<String>> {
        platform::window_titles()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

fn spawn_detached(program: &str, args: &[&str]) -> anyhow::Result<()> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("cannot start {program}: {e}"))?;
    Ok(())
}

/// An existing file is one word even if it contains spaces. Anything else
/// is a command line such as `explorer.exe shell:AppsFolder\...`.
fn command_words(path: &str) -> Vec<&str> {
    if Path::new(path).is_file() {
        vec![path]
    } else {
        path.split_whitespace().collect()
    }
}

impl Launcher for SystemLauncher {
    fn launch_application(&self, app: &AppEntry) -> anyhow::Result<()> {
        let path = app.executable_path.as_str();
        if path.is_empty() {
            bail!("no executable path for {}", app.process_name);
        }
        tracing::info!(path, "launching application");
        if cfg!(windows) {
            let mut args = vec!["/C", "start", ""];
            args.extend(command_words(path));
            spawn_detached("cmd", &args)
        } else if cfg!(target_os = "macos") {
            spawn_detached("open", &["-a", &app.process_name])
        } else {
            spawn_detached(path, &[])
        }
    }

    fn launch_browser_tabs(&self, browser: &BrowserSpec, urls: &[String]) -> anyhow::Result<()> {
        let Some((program, lead)) = browser.launch_command.split_first() else {
            bail!("no launch command configured for browser {}", browser.id);
        };
        let mut args: Vec<&str> = lead.iter().map(String::as_str).collect();
        args.extend(urls.iter().map(String::as_str));
        tracing::info!(browser = %browser.id, tabs = urls.len(), "opening tabs");
        spawn_detached(program, &args)
    }

    fn launch_folder(&self, folder_path: &str) -> anyhow::Result<()> {
        if !Path::new(folder_path).is_dir() {
            bail!("folder does not exist");
        }
        let opener = if cfg!(windows) {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        tracing::info!(path = folder_path, "opening folder");
        spawn_detached(opener, &[folder_path])
    }
}

#[cfg(any(windows, test))]
fn folder_entry(path: String) -> FolderEntry {
    let name = crate::matcher::folder_base_name(&path);
    let display_name = if name.is_empty() {
        path.clone()
    } else {
        name.to_string()
    };
    FolderEntry {
        display_name,
        folder_path: path,
    }
}

// ── Output parsing ──

/// `ConvertTo-Json` emits a bare object for one result and an array for
/// several.
#[cfg(any(windows, test))]
fn json_items(output: &str) -> anyhow::Result<Vec<serde_json::Value>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(match serde_json::from_str(output)? {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        other => vec![other],
    })
}

#[cfg(any(windows, test))]
#[derive(serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PsProcess {
    process_name: Option<String>,
    main_window_title: Option<String>,
    path: Option<String>,
}

#[cfg(any(windows, test))]
fn parse_powershell_apps(output: &str) -> anyhow::Result<Vec<AppEntry>> {
    Ok(json_items(output)?
        .into_iter()
        .filter_map(|item| serde_json::from_value::<PsProcess>(item).ok())
        .filter_map(|p| {
            let title = p.main_window_title.filter(|t| !t.is_empty())?;
            Some(AppEntry {
                process_name: p.process_name.unwrap_or_default(),
                window_title: title,
                executable_path: p.path.unwrap_or_default(),
            })
        })
        .collect())
}

#[cfg(any(windows, test))]
fn parse_string_list(output: &str) -> anyhow::Result<Vec<String>> {
    Ok(json_items(output)?
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
        .collect())
}

#[cfg(any(not(windows), test))]
#[derive(Debug, PartialEq)]
struct WmWindow {
    pid: u32,
    title: String,
}

/// Parse `wmctrl -lp`: `<id> <desktop> <pid> <host> <title...>`.
#[cfg(any(not(windows), test))]
fn parse_wmctrl(output: &str) -> Vec<WmWindow> {
    output
        .lines()
        .filter_map(|line| {
            let mut rest = line.trim_start();
            let mut fields = Vec::with_capacity(4);
            for _ in 0..4 {
                let end = rest.find(char::is_whitespace)?;
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            let pid: u32 = fields[2].parse().ok()?;
            let title = rest.trim();
            if pid == 0 || title.is_empty() {
                return None;
            }
            Some(WmWindow {
                pid,
                title: title.to_string(),
            })
        })
        .collect()
}

#[cfg(windows)]
mod platform {
    use super::{folder_entry, parse_powershell_apps, parse_string_list};
    use anyhow::bail;
    use fleck_core::{AppEntry, FolderEntry};
    use std::path::Path;
    use std::process::Command;

    const APPS_SCRIPT: &str = "Get-Process | Where-Object { $_.MainWindowTitle -ne '' } \
        | Select-Object ProcessName, MainWindowTitle, Path | ConvertTo-Json";
    const FOLDERS_SCRIPT: &str = "(New-Object -ComObject Shell.Application).Windows() \
        | Where-Object { $_.FullName -like '*explorer.exe' } \
        | ForEach-Object { $_.Document.Folder.Self.Path } | ConvertTo-Json";
    const TITLES_SCRIPT: &str = "$t = @(Get-Process | Where-Object { $_.MainWindowTitle -ne '' } \
        | ForEach-Object { $_.MainWindowTitle }); \
        $t += @((New-Object -ComObject Shell.Application).Windows() | ForEach-Object { $_.LocationName }); \
        $t | ConvertTo-Json";

    fn powershell(script: &str) -> anyhow::Result<String> {
        let out = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()?;
        if !out.status.success() {
            bail!(
                "powershell exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    pub fn running_applications() -> anyhow::Result<Vec<AppEntry>> {
        parse_powershell_apps(&powershell(APPS_SCRIPT)?)
    }

    pub fn open_folders() -> anyhow::Result<Vec<FolderEntry>> {
        Ok(parse_string_list(&powershell(FOLDERS_SCRIPT)?)?
            .into_iter()
            .filter(|p| Path::new(p).exists())
            .map(folder_entry)
            .collect())
    }

    pub fn window_titles() -> anyhow::Result<Vec<String>> {
        parse_string_list(&powershell(TITLES_SCRIPT)?)
    }
}

#[cfg(not(windows))]
mod platform {
    use super::parse_wmctrl;
    use anyhow::{anyhow, bail};
    use fleck_core::{AppEntry, FolderEntry};
    use std::collections::HashSet;
    use std::process::Command;
    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

    fn wmctrl() -> anyhow::Result<String> {
        let bin = which::which("wmctrl").map_err(|_| anyhow!("wmctrl not found on PATH"))?;
        let out = Command::new(bin).arg("-lp").output()?;
        if !out.status.success() {
            bail!("wmctrl exited with {}", out.status);
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    /// One entry per process that owns a window, titled by its first window.
    pub fn running_applications() -> anyhow::Result<Vec<AppEntry>> {
        let windows = parse_wmctrl(&wmctrl()?);
        let mut sys = System::new();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
        );

        let mut seen = HashSet::new();
        let mut apps = Vec::new();
        for window in windows {
            if !seen.insert(window.pid) {
                continue;
            }
            let Some(process) = sys.process(Pid::from_u32(window.pid)) else {
                continue;
            };
            apps.push(AppEntry {
                process_name: process.name().to_string_lossy().into_owned(),
                window_title: window.title,
                executable_path: process
                    .exe()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            });
        }
        Ok(apps)
    }

    /// File managers here expose no common way to ask for their folders.
    pub fn open_folders() -> anyhow::Result<Vec<FolderEntry>> {
        Ok(Vec::new())
    }

    pub fn window_titles() -> anyhow::Result<Vec<String>> {
        Ok(parse_wmctrl(&wmctrl()?)
            .into_iter()
            .map(|w| w.title)
            .collect())
    }
}

use clap::Subcommand;
use fleck_store::config::{read_raw, set_raw, unset_raw};
use fleck_store::{FleckConfig, FleckPaths};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. tab_limit)
        key: String,
        /// Config value (true/false, number, JSON array/object, or string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// Remove a config value, restoring its default
    Unset {
        /// Config key
        key: String,
    },
    /// List all config values
    List {
        /// Show the effective configuration, defaults included
        #[arg(long)]
        effective: bool,
    },
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, paths: &FleckPaths) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(paths, &key, &value),
        ConfigCmd::Get { key } => get(paths, &key),
        ConfigCmd::Unset { key } => unset(paths, &key),
        ConfigCmd::List { effective } => list(paths, effective),
    }
}

// ── Command Implementations ──

/// `fleck config set <key> <value>`
pub fn set(paths: &FleckPaths, key: &str, value: &str) -> anyhow::Result<()> {
    set_raw(paths, key, value)?;
    let stored = read_raw(paths);
    if let Some(v) = stored.get(key) {
        println!("{key} = {v}");
    }
    Ok(())
}

/// `fleck config get <key>`
pub fn get(paths: &FleckPaths, key: &str) -> anyhow::Result<()> {
    match read_raw(paths).get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `fleck config unset <key>`
pub fn unset(paths: &FleckPaths, key: &str) -> anyhow::Result<()> {
    if unset_raw(paths, key)? {
        println!("Removed {key}");
    } else {
        println!("{key} was not set");
    }
    Ok(())
}

/// `fleck config list [--effective]`
pub fn list(paths: &FleckPaths, effective: bool) -> anyhow::Result<()> {
    if effective {
        let config = FleckConfig::load(paths);
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    let config = read_raw(paths);
    if config.is_empty() {
        println!("(no config set)");
    } else {
        for (k, v) in &config {
            println!("{k} = {v}");
        }
    }
    Ok(())
}

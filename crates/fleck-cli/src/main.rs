mod cmd_config;
mod cmd_doctor;
mod cmd_snapshot;
mod cmd_timer;
mod cmd_todo;
mod cmd_track;
mod cmd_workspace;
mod render;

use clap::{Parser, Subcommand};
use fleck_core::{FleckError, Outcome, Priority, Status};
use fleck_store::FleckPaths;

#[derive(Parser)]
#[command(
    name = "fleck",
    version,
    about = "Save and restore task workspaces, and time the todos inside them"
)]
struct Cli {
    /// Log progress to stderr (same as RUST_LOG=info)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a workspace and make it the active one
    Create {
        /// Workspace (task) name
        name: String,
    },
    /// Delete a workspace: its snapshot, todos, and timers
    DeleteWorkspace {
        /// Workspace to delete (default: the active one)
        name: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Make another workspace active
    Switch {
        /// Workspace to switch to
        name: String,
        /// Save the current workspace before switching
        #[arg(long)]
        save: bool,
        /// Restore the target workspace after switching
        #[arg(long)]
        restore: bool,
    },
    /// Print the active workspace
    Current,
    /// List all workspaces
    Tasks,
    /// Capture the desktop into the active workspace
    Save,
    /// Reopen the applications, tabs, and folders of a workspace
    Restore {
        /// Workspace to restore (default: the active one)
        name: Option<String>,
    },
    /// Show what a workspace snapshot contains
    Show {
        /// Workspace to show (default: the active one)
        name: Option<String>,
    },
    /// Add a todo to the active workspace
    Add {
        /// Todo description
        description: String,
        /// high, medium, low, or none
        #[arg(short, long, default_value = "none")]
        priority: Priority,
    },
    /// List todos of the active workspace
    List {
        /// Only show todos in this state: todo, running, paused, done
        filter: Option<Status>,
    },
    /// Set the priority of a todo
    Flag {
        todo_id: String,
        /// high, medium, low, or none
        priority: Priority,
    },
    /// Delete a todo and its timer
    Delete { todo_id: String },
    /// Start working on a todo (starts its timer)
    Progress { todo_id: String },
    /// Pause a todo in progress
    Pause { todo_id: String },
    /// Resume a paused todo
    Resume { todo_id: String },
    /// Complete a todo and record its total time
    Done { todo_id: String },
    /// Live elapsed-time view for a todo (Ctrl+C to leave)
    Timer { todo_id: String },
    /// Re-save the active workspace periodically until Ctrl+C
    Track {
        /// Seconds between captures (default: config `track_interval_secs`)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Find and fix todos whose timer state disagrees with their status
    Doctor {
        /// Only report, do not change anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<FleckError>() {
            Some(fleck_err) => {
                eprintln!("{}", Outcome::from(fleck_err));
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = FleckPaths::from_env();
    paths.ensure_layout()?;

    match cli.cmd {
        Command::Create { name } => cmd_workspace::create(&paths, &name),
        Command::DeleteWorkspace { name, yes } => {
            cmd_workspace::delete(&paths, name.as_deref(), yes)
        }
        Command::Switch {
            name,
            save,
            restore,
        } => cmd_workspace::switch(&paths, &name, save, restore),
        Command::Current => cmd_workspace::current(&paths),
        Command::Tasks => cmd_workspace::tasks(&paths),
        Command::Save => cmd_snapshot::save(&paths),
        Command::Restore { name } => cmd_snapshot::restore(&paths, name.as_deref()),
        Command::Show { name } => cmd_snapshot::show(&paths, name.as_deref()),
        Command::Add {
            description,
            priority,
        } => cmd_todo::add(&paths, &description, priority),
        Command::List { filter } => cmd_todo::list(&paths, filter),
        Command::Flag { todo_id, priority } => cmd_todo::flag(&paths, &todo_id, priority),
        Command::Delete { todo_id } => cmd_todo::delete(&paths, &todo_id),
        Command::Progress { todo_id } => {
            cmd_todo::transition(&paths, &todo_id, cmd_todo::Action::Progress)
        }
        Command::Pause { todo_id } => {
            cmd_todo::transition(&paths, &todo_id, cmd_todo::Action::Pause)
        }
        Command::Resume { todo_id } => {
            cmd_todo::transition(&paths, &todo_id, cmd_todo::Action::Resume)
        }
        Command::Done { todo_id } => {
            cmd_todo::transition(&paths, &todo_id, cmd_todo::Action::Done)
        }
        Command::Timer { todo_id } => cmd_timer::execute(&paths, &todo_id),
        Command::Track { interval } => cmd_track::execute(&paths, interval),
        Command::Doctor { dry_run } => cmd_doctor::execute(&paths, dry_run),
        Command::Config { cmd } => cmd_config::run(cmd, &paths),
    }
}

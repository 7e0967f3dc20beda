//! Desktop capture and restore.
//!
//! [`RestoreEngine`] talks to the desktop only through the traits in
//! [`provider`], so the reconciliation logic runs unchanged against the real
//! system ([`system`], [`history`]) or an in-memory fake.

pub mod engine;
pub mod history;
pub mod matcher;
pub mod provider;
pub mod system;

pub use engine::{RestoreEngine, RestoreReport};
pub use history::ChromiumHistory;
pub use matcher::{folder_base_name, DefaultMatcher, PresenceMatcher};
pub use provider::{BrowserTabProvider, InventoryProvider, Launcher};
pub use system::{SystemInventory, SystemLauncher};

pub mod clock;
pub mod error;
pub mod snapshot;
pub mod status;
pub mod task;
pub mod timer;

pub use clock::{format_duration, now_rfc3339, Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, FleckError, Outcome, Result};
pub use snapshot::{
    webkit_to_unix, AppEntry, BrowserTab, FolderEntry, SnapshotSummary, WorkspaceSnapshot,
    RESERVED_POINTER_NAME,
};
pub use status::{is_valid_transition, Priority, Status};
pub use task::{validate_task_name, Task, Todo, WorkspaceContext};
pub use timer::{timer_key, TimerRecord, TimerStatus};

pub mod registry;
pub mod repair;
pub mod view;

pub use registry::{DeleteReport, TaskRegistry, Transition};
pub use repair::RepairAction;
pub use view::{TaskOverview, TodoView};

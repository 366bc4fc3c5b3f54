pub mod task;
pub mod user;

pub use task::{
    PriorityBreakdown, Task, TaskInput, TaskPriority, TaskStats, TaskStatus, TaskUpdate, TaskView,
    TaskViewRow,
};
pub use user::{Role, User, UserSummary, UserView};

mod scheduler;
mod session_pool;
mod task_log;

pub use scheduler::{
    FollowUp, Next, Plan, SchedulerConfig, Settlement, TaskAction, TaskScheduler, TaskSnapshot,
    TaskState,
};
pub use session_pool::SessionPool;
pub use task_log::{LogEntry, TaskLog};

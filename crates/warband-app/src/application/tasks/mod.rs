mod account_jobs;
mod game_task;

pub use account_jobs::AccountJobs;
pub use game_task::{GameTask, TaskContext};

mod action;
mod health_check;
mod task_manager;
mod task_spawner;
mod types;

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use super::TaskLog;
use warband_domain::TaskKey;

pub use action::{FollowUp, Next, Plan, Settlement, TaskAction};
pub use types::{SchedulerConfig, TaskSnapshot, TaskState};

use types::TaskEntry;

/// Registry of keyed timers. One live entry per [`TaskKey`]; registering a
/// key again replaces its entry and disarms the old timer.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct TaskScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    entries: Mutex<HashMap<TaskKey, TaskEntry>>,
    /// Serialises firings of the same key across replacements.
    firing_locks: std::sync::Mutex<HashMap<TaskKey, Arc<Mutex<()>>>>,
    task_log: Arc<TaskLog>,
    config: SchedulerConfig,
    accepting: AtomicBool,
    in_flight: Arc<watch::Sender<usize>>,
    health_check_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskScheduler {
    pub fn new(config: SchedulerConfig, task_log: Arc<TaskLog>) -> Self {
        let (in_flight, _) = watch::channel(0usize);
        Self {
            inner: Arc::new(SchedulerInner {
                entries: Mutex::new(HashMap::new()),
                firing_locks: std::sync::Mutex::new(HashMap::new()),
                task_log,
                config,
                accepting: AtomicBool::new(true),
                in_flight: Arc::new(in_flight),
                health_check_handle: Mutex::new(None),
            }),
        }
    }

    pub async fn start(&self) {
        info!("✅ Task scheduler started (using tokio timer)");
        self.start_health_check_task().await;
    }

    pub fn task_log(&self) -> &Arc<TaskLog> {
        &self.inner.task_log
    }
}

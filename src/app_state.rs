use std::sync::Arc;

use crate::task::TaskStore;

/// 全局应用状态，负责在各个 handler 之间共享任务存储
pub struct AppState {
    pub task_store: Arc<TaskStore>,
}

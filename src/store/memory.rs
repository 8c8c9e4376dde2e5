//! In-memory task store.
//!
//! The reference backend for development and tests: a `RwLock`-guarded map
//! plus an insertion counter so `list()` returns tasks in creation order
//! even when timestamps collide.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewTask, Task, TaskStore};
use crate::error::{GatewayError, GatewayResult};

/// `TaskStore` backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: RwLock<HashMap<Uuid, (u64, Task)>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, task: NewTask) -> GatewayResult<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            title: task.title,
            created_at: Utc::now(),
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.tasks.write().await.insert(task.id, (seq, task.clone()));
        Ok(task)
    }

    async fn list(&self) -> GatewayResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut entries: Vec<&(u64, Task)> = tasks.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, task)| task.clone()).collect())
    }

    async fn delete(&self, id: Uuid) -> GatewayResult<()> {
        match self.tasks.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(GatewayError::NotFound(format!("no task with id {id}"))),
        }
    }
}

//! The task-store capability consumed by the gateway.
//!
//! Handlers talk to an opaque [`TaskStore`]; which backend implements it is
//! a deployment decision made once at startup via [`connect`]. The gateway
//! core never names a concrete backend.

mod memory;

pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};

/// A stored todo item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id.
    pub id: Uuid,
    /// Task title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title; must be non-empty.
    pub title: String,
}

/// Storage capability for todo items.
///
/// Errors surface as [`GatewayError::NotFound`] or
/// [`GatewayError::StoreUnavailable`] and are mapped to status codes by the
/// handlers, not here.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task, returning it with its assigned id.
    async fn create(&self, task: NewTask) -> GatewayResult<Task>;

    /// List every stored task. An empty store yields an empty vector, never
    /// an error.
    async fn list(&self) -> GatewayResult<Vec<Task>>;

    /// Delete a task by id; `NotFound` if no such task exists.
    async fn delete(&self, id: Uuid) -> GatewayResult<()>;
}

/// Connect the store backend named by a connection string.
///
/// `mem://` selects the in-memory store. Anything else is a connection
/// failure — the caller treats that as fatal at startup.
pub fn connect(conn: &str) -> GatewayResult<Arc<dyn TaskStore>> {
    if conn.starts_with("mem://") {
        return Ok(Arc::new(MemoryStore::new()));
    }

    Err(GatewayError::StoreUnavailable(format!(
        "unsupported store connection string '{conn}'"
    )))
}

//! Todo CRUD handlers over the task-store capability.
//!
//! Store errors propagate out of these handlers as `GatewayError` and are
//! mapped to status codes by the shared error response path: not-found →
//! 404, store unavailable → 503.

use axum::http::StatusCode;
use tracing::info;
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};
use crate::router::{GatewayRequest, GatewayResponse};
use crate::state::AppState;
use crate::store::NewTask;

/// `POST /todos` — create a task from a `{"title": ...}` body.
pub async fn create_todo(state: AppState, req: GatewayRequest) -> GatewayResult<GatewayResponse> {
    let new_task: NewTask = serde_json::from_slice(&req.body)?;

    if new_task.title.trim().is_empty() {
        return Err(GatewayError::BadRequest(
            "title must not be empty".to_string(),
        ));
    }

    let task = state.store.create(new_task).await?;
    info!(task_id = %task.id, "task created");

    Ok(GatewayResponse::json(StatusCode::CREATED, &task))
}

/// `GET /todos` — list all tasks. An empty store yields `[]`, never an
/// absent body.
pub async fn list_todos(state: AppState, _req: GatewayRequest) -> GatewayResult<GatewayResponse> {
    let tasks = state.store.list().await?;
    Ok(GatewayResponse::json(StatusCode::OK, &tasks))
}

/// `DELETE /todos/:id` — delete a task by id.
///
/// A non-UUID id is a 400; an unknown id surfaces the store's not-found as
/// a 404.
pub async fn delete_todo(state: AppState, req: GatewayRequest) -> GatewayResult<GatewayResponse> {
    let raw = req
        .param("id")
        .ok_or_else(|| GatewayError::Internal("route pattern missing :id parameter".to_string()))?;

    let id = Uuid::parse_str(raw)
        .map_err(|_| GatewayError::BadRequest(format!("'{raw}' is not a valid task id")))?;

    state.store.delete(id).await?;
    info!(task_id = %id, "task deleted");

    Ok(GatewayResponse::status(StatusCode::NO_CONTENT))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::AppState;
use crate::actions::{self, ActionOutcome};
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Log a write failure and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Read-through views
// ============================================================

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.report().await)
}

pub async fn list_memory(State(state): State<AppState>) -> Json<Vec<MemoryFile>> {
    Json(state.memory.list_or_empty().await)
}

pub async fn list_skills(State(state): State<AppState>) -> Json<Vec<Skill>> {
    Json(state.skills.list_or_empty().await)
}

pub async fn list_cron(State(state): State<AppState>) -> Json<Vec<CronJob>> {
    Json(state.cron.list_or_empty().await)
}

pub async fn knowcore_status(State(state): State<AppState>) -> Json<KnowcoreStatus> {
    Json(state.knowcore.status().await)
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.tasks.list().await)
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<CreateTaskInput>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    let tasks = state.tasks.add(input).await.map_err(internal_error)?;
    state.hub.broadcast(EventKind::Tasks, &tasks);
    Ok(Json(tasks))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTaskStatusInput>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    let tasks = state
        .tasks
        .set_status(&id, input.status)
        .await
        .map_err(internal_error)?;
    state.hub.broadcast(EventKind::Tasks, &tasks);
    Ok(Json(tasks))
}

// ============================================================
// Actions
// ============================================================

pub async fn run_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Json<ActionOutcome> {
    Json(actions::run(&action, &state).await)
}

/// Workflow management REST API endpoints
///
/// Register, list, fetch, delete and execute workflows. Every handler is a
/// thin adapter over [`WorkflowRegistry`]; registry calls run synchronously
/// on the request task.

use crate::{
    api::error::{ApiError, ApiResult},
    workflow::{error::RegistryError, registry::WorkflowRegistry, types::WorkflowDefinition},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, sync::Arc};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Registry of loaded workflows, backed by the workflows directory
    pub registry: Arc<WorkflowRegistry>,
}

/// Request body for workflow registration
#[derive(Debug, Deserialize)]
pub struct RegisterWorkflowRequest {
    pub name: String,
    /// Filename -> source text
    pub code_files: BTreeMap<String, String>,
    #[serde(default)]
    pub workflow_id: Option<String>,
}

/// Request body for workflow execution
#[derive(Debug, Deserialize)]
pub struct ExecuteWorkflowRequest {
    pub workflow_id: String,
    #[serde(default)]
    pub inputs: Map<String, Value>,
}

/// Create workflow management routes
///
/// `/workflows/execute` is a static segment, so it never collides with the
/// `{id}` routes (which only accept GET and DELETE).
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/workflows", get(list_workflows).post(register_workflow))
        .route("/workflows/execute", post(execute_workflow))
        .route("/workflows/{id}", get(get_workflow).delete(delete_workflow))
}

/// List all workflows
///
/// GET /workflows
async fn list_workflows(State(state): State<AppState>) -> Json<Vec<WorkflowDefinition>> {
    Json(
        state
            .registry
            .list_all()
            .into_iter()
            .map(WorkflowDefinition::from)
            .collect(),
    )
}

/// Get a specific workflow by ID
///
/// GET /workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WorkflowDefinition>> {
    state
        .registry
        .get_metadata(&id)
        .map(|metadata| Json(metadata.into()))
        .ok_or_else(|| RegistryError::NotFound(id).into())
}

/// Execute a workflow
///
/// POST /workflows/execute
/// Body: { "workflow_id": "...", "inputs": { ... } }
async fn execute_workflow(
    State(state): State<AppState>,
    Json(payload): Json<ExecuteWorkflowRequest>,
) -> ApiResult<Json<Map<String, Value>>> {
    let output = state.registry.execute(&payload.workflow_id, payload.inputs)?;
    Ok(Json(output))
}

/// Register (or re-register) a workflow
///
/// POST /workflows
/// Body: { "name": "...", "code_files": { "main.lua": "..." }, "workflow_id": "..." }
async fn register_workflow(
    State(state): State<AppState>,
    Json(payload): Json<RegisterWorkflowRequest>,
) -> ApiResult<(StatusCode, Json<WorkflowDefinition>)> {
    let metadata = state
        .registry
        .register(payload.workflow_id, &payload.name, &payload.code_files)?;

    Ok((StatusCode::CREATED, Json(metadata.into())))
}

/// Delete a workflow
///
/// DELETE /workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.registry.delete(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::DeleteFailed(id))
    }
}

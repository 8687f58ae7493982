//! Scheduled project records

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use buildsync::storage::ProjectStorage;
use buildsync::ProjectRecord;

/// List all scheduled projects
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<ProjectRecord>>> {
    let projects = state.storage.list_projects().await?;
    Ok(Json(projects))
}

/// Get a single scheduled project
pub async fn get_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ProjectRecord>> {
    let project = state
        .storage
        .get_project(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project {}", name)))?;
    Ok(Json(project))
}

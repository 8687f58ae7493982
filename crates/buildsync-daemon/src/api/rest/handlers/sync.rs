//! On-demand sync pass

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use buildsync::SyncOutcome;

/// Run one pass and return its report
///
/// Answers 409 while another pass is running.
pub async fn trigger_sync(State(state): State<AppState>) -> ApiResult<Json<SyncOutcome>> {
    let outcome = state.trigger.try_run().await?;
    Ok(Json(outcome))
}

use crate::{AppState, types::WorkerInfo};
use axum::{Json, extract::State};

/// List the workers this server can dispatch to
#[utoipa::path(
    get,
    path = "/api/workers",
    responses(
        (status = 200, description = "Registered workers", body = Vec<WorkerInfo>)
    ),
    tag = "workers"
)]
pub async fn list_workers(State(state): State<AppState>) -> Json<Vec<WorkerInfo>> {
    Json(
        state
            .registry()
            .kinds()
            .into_iter()
            .map(WorkerInfo::from)
            .collect(),
    )
}

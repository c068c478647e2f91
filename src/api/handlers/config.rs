use crate::{
    AppState,
    types::{ReloadResponse, Result},
};
use axum::{Json, extract::State};
use chrono::Utc;

/// Re-read the config file and rebuild the engine for subsequent queries
#[utoipa::path(
    post,
    path = "/api/config/reload",
    responses(
        (status = 200, description = "New configuration is active", body = ReloadResponse),
        (status = 500, description = "Reload failed, previous configuration kept")
    ),
    tag = "system"
)]
pub async fn reload_config(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    state.reload()?;
    Ok(Json(ReloadResponse {
        status: "reloaded".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

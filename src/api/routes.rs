use crate::AppState;
use crate::api::handlers::{config, health, query, workers};
use crate::types::{
    HealthResponse, OutputFormat, QueryRequest, QueryResponse, ReloadResponse, WorkerInfo,
    WorkerKind,
};
use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// OpenAPI document for the HTTP surface
#[derive(OpenApi)]
#[openapi(
    info(title = "repurpose", description = "Drug repurposing research orchestrator"),
    paths(
        health::health,
        config::reload_config,
        workers::list_workers,
        query::query,
        query::query_stream,
    ),
    components(schemas(
        HealthResponse,
        OutputFormat,
        QueryRequest,
        QueryResponse,
        ReloadResponse,
        WorkerInfo,
        WorkerKind,
    )),
    tags(
        (name = "system", description = "Service status and configuration"),
        (name = "workers", description = "Worker capabilities"),
        (name = "query", description = "Research queries"),
    )
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// API routes, without state or middleware
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/config/reload", post(config::reload_config))
        .route("/workers", get(workers::list_workers))
        .route("/query", post(query::query))
        .route("/query/stream", post(query::query_stream))
        .route("/openapi.json", get(openapi))
}

/// Complete application: `/api` routes plus tracing and CORS layers
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

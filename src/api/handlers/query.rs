//! Research query handlers
//!
//! Both endpoints run the same workflow; the streaming one forwards each
//! stage transition as an SSE `stage` event and ends with a `result` event
//! carrying the [`QueryResponse`] the blocking endpoint would have returned.
//! Dropping the SSE connection drops the run, which stops in-flight workers.

use crate::{
    AppState,
    types::{AppError, QueryRequest, QueryResponse, Result},
    workflows::WorkflowEvent,
};
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

fn validate(request: &QueryRequest) -> Result<()> {
    if request.query.trim().is_empty() {
        return Err(AppError::InvalidInput("Query must not be empty".to_string()));
    }
    Ok(())
}

/// Run a research query
#[utoipa::path(
    post,
    path = "/api/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Workflow finished; check `success`", body = QueryResponse),
        (status = 400, description = "Invalid input")
    ),
    tag = "query"
)]
pub async fn query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    validate(&payload)?;
    info!(query = %payload.query, "Query received");

    let output = state.engine().run(payload.into_query()).await;
    Ok(Json(QueryResponse::from(output)))
}

/// Run a research query, streaming stage transitions
#[utoipa::path(
    post,
    path = "/api/query/stream",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Server-Sent Events: `stage` per transition, `tasks` before execution, then `result`"),
        (status = 400, description = "Invalid input")
    ),
    tag = "query"
)]
pub async fn query_stream(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    validate(&payload)?;
    info!(query = %payload.query, "Streaming query received");

    let events = state
        .engine()
        .run_stream(payload.into_query(), CancellationToken::new());

    let stream = async_stream::stream! {
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            let sse = match event {
                WorkflowEvent::Stage { stage, status } => Event::default()
                    .event("stage")
                    .json_data(json!({ "stage": stage, "status": status })),
                WorkflowEvent::TasksStarted { tasks } => Event::default()
                    .event("tasks")
                    .json_data(json!({ "tasks": tasks })),
                WorkflowEvent::Finished(output) => Event::default()
                    .event("result")
                    .json_data(QueryResponse::from(*output)),
            };
            match sse {
                Ok(sse) => yield Ok(sse),
                Err(e) => yield Ok(Event::default().event("error").data(e.to_string())),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}

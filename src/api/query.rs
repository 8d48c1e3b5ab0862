//! Info and query endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use super::ApiState;
use crate::Error;
use crate::assemble::AggregateResponse;
use crate::hub::MISSING_INPUT;

/// Message returned when the node source cannot be loaded
pub const NODE_SOURCE_FAILED: &str = "Failed to read node source";

/// Query string of `GET /query`
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub input: Option<String>,
}

/// Hub identifier, verbatim
async fn info(State(state): State<Arc<ApiState>>) -> String {
    state.hub.config().hub.clone()
}

/// Fan the input out to every enabled node
async fn query(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<AggregateResponse>, (StatusCode, String)> {
    let input = params.input.unwrap_or_default();
    tracing::debug!(input = %input, "query received");

    match state.hub.query(&input).await {
        Ok(response) => Ok(Json(response)),
        Err(Error::Validation(_)) => Err((StatusCode::BAD_REQUEST, MISSING_INPUT.to_string())),
        Err(e) => {
            tracing::error!(error = %e, "query failed before dispatch");
            Err((StatusCode::INTERNAL_SERVER_ERROR, NODE_SOURCE_FAILED.to_string()))
        }
    }
}

/// Build info and query routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(info))
        .route("/query", get(query))
        .with_state(state)
}

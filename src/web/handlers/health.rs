//! 健康检查

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::web::types::{AppState, HealthResponse};

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        engines: state.engines.clone(),
    })
}

use crate::auth::AuthenticatedUser;
use crate::models::{HealthResponse, StatsResponse};
use crate::state::AppState;
use axum::{Json, extract::State};

pub async fn health(_user: AuthenticatedUser) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn stats(State(state): State<AppState>, _user: AuthenticatedUser) -> Json<StatsResponse> {
    let service = &state.service;
    Json(StatsResponse {
        running: service.is_running().await,
        subscribers: service.subscriber_count(),
        tick_interval_ms: service.tick_interval().as_millis() as u64,
        metrics: service.metrics(),
    })
}

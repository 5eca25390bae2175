use crate::handlers::{health, tickers, ws};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/tickers", get(tickers::list_tickers))
        .route("/tickers/{symbol}", get(tickers::get_ticker))
        .route("/tickers/{symbol}/reset", post(tickers::reset_ticker))
        .route("/stats", get(health::stats));

    Router::new()
        .route("/health", get(health::health))
        .route("/ws/ticker", get(ws::ws_handler))
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

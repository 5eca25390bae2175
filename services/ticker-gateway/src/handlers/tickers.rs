use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use types::ticker::TickerUpdate;

pub async fn list_tickers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Json<Vec<TickerUpdate>> {
    Json(state.service.snapshot())
}

pub async fn get_ticker(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(symbol): Path<String>,
) -> Result<Json<TickerUpdate>, AppError> {
    Ok(Json(state.service.get(&symbol)?))
}

pub async fn reset_ticker(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(symbol): Path<String>,
) -> Result<Json<TickerUpdate>, AppError> {
    let update = state.service.reset(&symbol)?;
    tracing::info!(user = %user.username, symbol = %update.symbol, "Ticker reset via API");
    Ok(Json(update))
}

//! HTTP and WebSocket surface for the live ticker feed.
//!
//! Routes:
//! - `GET /health`
//! - `GET /v1/tickers`, `GET /v1/tickers/{symbol}`,
//!   `POST /v1/tickers/{symbol}/reset`, `GET /v1/stats`
//! - `GET /ws/ticker` (streaming; unauthorized sessions closed with 4403)

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;

pub use handlers::ws::CLOSE_FORBIDDEN;
pub use router::create_router;
pub use state::AppState;

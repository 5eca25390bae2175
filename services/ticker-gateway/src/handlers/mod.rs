pub mod health;
pub mod tickers;
pub mod ws;

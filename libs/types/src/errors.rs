//! Error types for the ticker feed
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Errors surfaced by the price engine to its callers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl FeedError {
    pub fn unknown_symbol(symbol: impl Into<String>) -> Self {
        FeedError::UnknownSymbol {
            symbol: symbol.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        FeedError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// A single subscriber could not take a message.
///
/// Never escapes the broadcaster; the subscriber's own connection task is
/// responsible for noticing the disconnect.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Subscriber connection closed")]
    Closed,

    #[error("Subscriber outbound queue full")]
    Backlogged,
}

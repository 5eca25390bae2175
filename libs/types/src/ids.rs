//! Identifier types for the ticker feed
//!
//! Subscribers are identified by UUID v7 so that connection ids sort by
//! connect time in logs. Symbols are normalized, uppercase tickers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Maximum accepted symbol length.
pub const MAX_SYMBOL_LEN: usize = 16;

/// Unique identifier for a live streaming connection
///
/// Identity only: two subscribers are the same subscriber iff their ids
/// match, whatever they carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new SubscriberId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tradable instrument identifier (e.g. "AAPL", "BRK.B")
///
/// Always stored uppercase, so lookups through [`Symbol::try_new`] are
/// case-insensitive. Deserialization applies the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

/// Rejected symbol text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid symbol {0:?}: expected 1-{MAX_SYMBOL_LEN} chars of [A-Z0-9.-]")]
pub struct InvalidSymbol(pub String);

impl Symbol {
    /// Create a new Symbol from a string
    ///
    /// # Panics
    /// Panics if the symbol is empty, too long or contains characters other
    /// than ASCII alphanumerics, `.` and `-`
    pub fn new(symbol: impl AsRef<str>) -> Self {
        match Self::try_new(symbol) {
            Some(symbol) => symbol,
            None => panic!("Symbol must be 1-{MAX_SYMBOL_LEN} chars of [A-Z0-9.-]"),
        }
    }

    /// Try to create a Symbol, returning None if invalid
    pub fn try_new(symbol: impl AsRef<str>) -> Option<Self> {
        let s = symbol.as_ref().trim();
        let valid = !s.is_empty()
            && s.len() <= MAX_SYMBOL_LEN
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        valid.then(|| Self(s.to_ascii_uppercase()))
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = InvalidSymbol;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(&s).ok_or(InvalidSymbol(s))
    }
}

impl TryFrom<&str> for Symbol {
    type Error = InvalidSymbol;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_new(s).ok_or_else(|| InvalidSymbol(s.to_string()))
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

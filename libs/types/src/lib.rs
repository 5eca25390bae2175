//! Types library for the live ticker feed
//!
//! Value types shared by the price engine and the gateway: identifiers,
//! price arithmetic, the per-symbol ticker record, the outbound wire
//! envelope and the error taxonomy.
//!
//! # Modules
//! - `ids`: Identifiers (Symbol, SubscriberId)
//! - `numeric`: Decimal price type and read-side rounding
//! - `ticker`: TickerUpdate record and FeedMessage envelope
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod ticker;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::ticker::*;
    pub use crate::errors::*;
}

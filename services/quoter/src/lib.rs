//! # SmarDex Quoter - Price Curves at a Block
//!
//! ## Purpose
//!
//! Answers "how much `to` for these amounts of `from`" (sells) and "how much
//! `from` for these amounts of `to`" (buys) against the SmarDex pool of a
//! token pair, at an explicit block height.
//!
//! ## Integration Points
//!
//! - **Discovery**: `smardex-state::PairRegistry` (factory `getPair`)
//! - **State**: `smardex-state::BatchSynchronizer` and `PoolStateCache`
//! - **Math**: `smardex-amm` sell/buy quoting on a `PoolSnapshot`
//! - **Output**: `PoolPrices`, serializable as JSON for the CLI
//!
//! ## Architecture Role
//!
//! ```text
//! CLI / router ─→ [PriceSource::quote] ─→ Option<PoolPrices>
//!                         │
//!            registry → synchronizer → cache → math
//! ```
//!
//! No failure escapes as a panic or error from `quote`; use
//! `SmardexPriceSource::try_quote` to see why a pair was not priced.

pub mod clock;
pub mod error;
pub mod price_source;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::QuoteError;
pub use price_source::{PriceSource, SmardexPriceSource};
pub use types::{PoolPrices, QuoteRequest, Token};

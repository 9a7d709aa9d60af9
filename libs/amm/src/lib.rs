//! # SmarDex AMM Library - Fictive Reserve Invariant Engine
//!
//! ## Purpose
//!
//! Integer-exact mathematics for SmarDex pools. A SmarDex pool holds real
//! reserves, a smaller pair of fictive reserves that set the execution price,
//! and a time-weighted price average that damps short-term manipulation.
//! This crate reproduces the on-chain swap computation so that quotes match
//! settlement to the last wei.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `PoolSnapshot` values produced by the batch synchronizer
//! - **Output Destinations**: Quote orchestrator building sell/buy price curves
//! - **Fee Policy**: `FeePolicy` decides legacy (fixed) vs dynamic fees per pool
//! - **Precision**: Unbounded `BigUint` intermediates, `U256` at the boundary
//!
//! ## Architecture Role
//!
//! ```text
//! PoolSnapshot ──► orient(token0_in) ──► price average update
//!                                          │
//!                    first-leg sizing ◄────┘
//!                          │
//!          fictive rebalancing ──► k-const rule (x·y=k on fictive reserves)
//!                          │
//!                     amount out / amount in
//! ```
//!
//! The engine never touches I/O or shared state: every entry point takes a
//! snapshot by reference and returns a value.

pub mod error;
pub mod fees;
pub mod pool_traits;
pub mod smardex_math;

pub use error::MathError;
pub use fees::{FeeMode, FeePolicy, PoolFees, FEES_BASE, FEES_LEGACY_LAYER_ONE};
pub use pool_traits::{PoolSnapshot, SwapSide};
pub use smardex_math::{quote_buy, quote_sell, SwapOutcome, SwapParams};

/// Common numeric types for AMM calculations
pub use ethers_core::types::{Address, U256};

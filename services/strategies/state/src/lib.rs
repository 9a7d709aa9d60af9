//! # SmarDex Pool State - Discovery, Caching and Batched Refresh
//!
//! ## Purpose
//!
//! Keeps a local mirror of SmarDex pool state fresh enough to quote at a given
//! block height. Pools are discovered lazily per token pair, their snapshots
//! are cached per block, and stale pools are refreshed together in a single
//! aggregate read.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Factory `getPair` lookups and Multicall aggregate reads via `ChainReader`
//! - **Output Destinations**: Quote orchestrator reading snapshots for a block
//! - **Fee Policy**: Legacy/dynamic fee mode fixed per pool at discovery time
//! - **Consistency**: Whole-value snapshot replacement, all-or-nothing batches
//!
//! ## Architecture Role
//!
//! ```text
//! (token_a, token_b) → [PairRegistry] → DiscoveredPool{address, fee_mode}
//!                                              ↓
//!                      [BatchSynchronizer] → one aggregate call per batch
//!                                              ↓
//!                      [PoolStateCache]   → PoolSnapshot valid for block N only
//! ```
//!
//! Refresh is pull-based: nothing runs in the background, and concurrent
//! callers may fetch the same pool twice without affecting correctness.

pub mod pair_registry;
pub mod pool_cache;
pub mod synchronizer;

pub use pair_registry::{DiscoveredPool, Pair, PairRegistry, TokenPair};
pub use pool_cache::{CachedSnapshot, PoolCacheStats, PoolStateCache};
pub use synchronizer::{BatchSynchronizer, SyncError, SyncReport};

//! SmarDex contract access library
//!
//! This library provides the on-chain boundary of the SmarDex price source:
//! ABI encoding for every read the synchronizer and registry issue, and the
//! `ChainReader` trait that executes them.
//!
//! # Architecture
//!
//! ```text
//! dex_utils/
//! ├── abi/        # ABI definitions and call decoders
//! │   ├── smardex_pair.rs  # Pair reserves, fictive reserves, price average, fees
//! │   ├── factory.rs       # getPair lookup
//! │   └── multicall.rs     # aggregate batching
//! ├── chain.rs    # ChainReader trait and ethers-backed reader
//! └── testing.rs  # In-memory reader for tests
//! ```
//!
//! # Design Principles
//! - Single canonical source for SmarDex ABIs
//! - Decoders return full 256-bit values, never truncated
//! - Decoding failures are typed, never panics

pub mod abi;
pub mod chain;
pub mod testing;

// Re-export commonly used types
pub use abi::{Call, DecodingError, PriceAverage, Reserves};
pub use chain::{ChainError, ChainReader, EthersChainReader};

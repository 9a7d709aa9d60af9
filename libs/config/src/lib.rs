//! # SmarDex Configuration
//!
//! Static, per-network settings for the SmarDex price source, loaded once at
//! startup and immutable afterwards.
//!
//! ## Features
//!
//! - **Network Settings**: factory, multicall, RPC endpoint, gas cost per chain
//! - **Legacy Pools**: fixed-fee pool list and the fee pair applied to them
//! - **Layered Loading**: base TOML, optional environment file, `SMARDEX_` env vars
//!
//! ## Usage
//!
//! ```rust,no_run
//! use smardex_config::load_config;
//!
//! let config = load_config(None, None)?;
//! let ethereum = config.network("ethereum")?;
//! let policy = ethereum.fee_policy();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod service;
pub mod service_config;

// Re-export commonly used types
pub use service::MULTICALL3_ADDRESS;
pub use service_config::{load_config, LegacyFees, NetworkConfig, SmardexConfig};

//! Defaults and constants shared by the SmarDex services

use ethers_core::types::{Address, H160};

/// Loader defaults
pub mod loader {
    /// Config file used when no path is given
    pub const DEFAULT_CONFIG_PATH: &str = "config/smardex.toml";

    /// Directory (relative to the base file) holding per-environment overrides
    pub const ENVIRONMENTS_DIR: &str = "environments";

    /// Prefix for environment-variable overrides, e.g. `SMARDEX_NETWORKS__ETHEREUM__GAS_COST`
    pub const ENV_PREFIX: &str = "SMARDEX";

    /// Separator between nested keys in environment overrides
    pub const ENV_SEPARATOR: &str = "__";
}

/// Network defaults
pub mod network {
    /// Default DEX key used in pool identifiers
    pub const DEFAULT_DEX_KEY: &str = "smardex";

    /// Gas reported with every quote when the network sets none
    pub const DEFAULT_POOL_GAS_COST: u64 = 90_000;
}

/// Multicall3 is deployed at the same address on every supported chain
pub const MULTICALL3_ADDRESS: Address = H160([
    0xca, 0x11, 0xbd, 0xe0, 0x59, 0x77, 0xb3, 0x63, 0x11, 0x67, 0x02, 0x88, 0x62, 0xbe, 0x2a, 0x17,
    0x39, 0x76, 0xca, 0x11,
]);

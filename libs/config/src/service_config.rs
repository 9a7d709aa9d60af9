//! Network Configuration Module
//!
//! Loads the per-network SmarDex settings from TOML with an optional
//! environment-specific override file and `SMARDEX_`-prefixed environment
//! variables layered on top.

use crate::service::{loader, network, MULTICALL3_ADDRESS};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use smardex_amm::{FeePolicy, PoolFees, FEES_LEGACY_LAYER_ONE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Root configuration: one entry per network name
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmardexConfig {
    pub networks: HashMap<String, NetworkConfig>,
}

/// Deployment settings for one chain
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_dex_key")]
    pub dex_key: String,

    pub chain_id: u64,
    pub factory_address: Address,

    #[serde(default = "default_multicall")]
    pub multicall_address: Address,

    /// Pools deployed with fixed, non-queryable fees
    #[serde(default)]
    pub legacy_pairs: Vec<Address>,

    #[serde(default)]
    pub legacy_fees: LegacyFees,

    /// JSON-RPC endpoint; `${VAR}` references are expanded after loading
    pub rpc_url: String,

    #[serde(default = "default_gas_cost")]
    pub gas_cost: u64,
}

/// Fee pair applied to every legacy pool, parts per million
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFees {
    pub fees_lp: u64,
    pub fees_pool: u64,
}

impl Default for LegacyFees {
    fn default() -> Self {
        Self {
            fees_lp: FEES_LEGACY_LAYER_ONE.fees_lp as u64,
            fees_pool: FEES_LEGACY_LAYER_ONE.fees_pool as u64,
        }
    }
}

impl From<LegacyFees> for PoolFees {
    fn from(fees: LegacyFees) -> Self {
        PoolFees::new(fees.fees_lp as u128, fees.fees_pool as u128)
    }
}

fn default_dex_key() -> String {
    network::DEFAULT_DEX_KEY.to_string()
}

fn default_multicall() -> Address {
    MULTICALL3_ADDRESS
}

fn default_gas_cost() -> u64 {
    network::DEFAULT_POOL_GAS_COST
}

impl NetworkConfig {
    pub fn legacy_fees(&self) -> PoolFees {
        self.legacy_fees.into()
    }

    /// Fee policy built from the static legacy pool list
    pub fn fee_policy(&self) -> FeePolicy {
        FeePolicy::new(self.legacy_pairs.iter().copied(), self.legacy_fees())
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.factory_address.is_zero() {
            bail!("Network {}: factory_address must not be the zero address", name);
        }
        if self.multicall_address.is_zero() {
            bail!("Network {}: multicall_address must not be the zero address", name);
        }
        if !self.legacy_fees().is_valid() {
            bail!(
                "Network {}: legacy fees {}+{} reach the fee base",
                name,
                self.legacy_fees.fees_lp,
                self.legacy_fees.fees_pool
            );
        }
        if self.rpc_url.trim().is_empty() {
            bail!("Network {}: rpc_url is empty", name);
        }
        Ok(())
    }
}

impl SmardexConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(loader::DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = base
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(PathBuf::new)
                .join(loader::ENVIRONMENTS_DIR)
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(loader::ENV_PREFIX)
                .prefix_separator("_")
                .separator(loader::ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Settings for a single network
    pub fn network(&self, name: &str) -> Result<&NetworkConfig> {
        self.networks
            .get(name)
            .with_context(|| format!("Network {} is not configured", name))
    }

    /// Expand environment variables in RPC URLs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for (name, network) in &mut self.networks {
            let expanded = shellexpand::env(&network.rpc_url)
                .with_context(|| format!("Failed to expand RPC URL for {}", name))?;
            network.rpc_url = expanded.to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.networks.is_empty() {
            bail!("No networks configured");
        }
        for (name, network) in &self.networks {
            network.validate(name)?;
            debug!(
                network = %name,
                chain_id = network.chain_id,
                legacy_pairs = network.legacy_pairs.len(),
                "Network configuration validated"
            );
        }
        Ok(())
    }
}

/// Load, expand and validate in one step
pub fn load_config(base_path: Option<&Path>, environment: Option<&str>) -> Result<SmardexConfig> {
    let mut config = SmardexConfig::load(base_path, environment)?;
    config.expand_env_vars()?;
    config.validate()?;
    Ok(config)
}

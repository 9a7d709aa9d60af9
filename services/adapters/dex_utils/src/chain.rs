//! Contract reads against the chain
//!
//! `ChainReader` is the only seam between the price source and the network:
//! a factory lookup and one batched read pinned to a block. Production code
//! uses [`EthersChainReader`]; tests substitute an in-memory reader.

use crate::abi::{self, Call, DecodingError};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, BlockId, BlockNumber, TransactionRequest, U64};
use std::sync::Arc;
use tracing::debug;

/// Failures talking to the chain
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("Invalid RPC endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error(transparent)]
    Decoding(#[from] DecodingError),
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Pool registered by the factory for the pair; zero address when none
    async fn get_pair(
        &self,
        factory: Address,
        token0: Address,
        token1: Address,
    ) -> Result<Address, ChainError>;

    /// Execute all calls in one request at `block`, returning raw results in order
    async fn aggregate(&self, calls: Vec<Call>, block: u64) -> Result<Vec<Vec<u8>>, ChainError>;
}

/// JSON-RPC reader backed by an ethers HTTP provider
#[derive(Debug, Clone)]
pub struct EthersChainReader {
    provider: Arc<Provider<Http>>,
    multicall: Address,
}

impl EthersChainReader {
    pub fn new(provider: Arc<Provider<Http>>, multicall: Address) -> Self {
        Self {
            provider,
            multicall,
        }
    }

    pub fn connect(rpc_url: &str, multicall: Address) -> Result<Self, ChainError> {
        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| ChainError::InvalidEndpoint {
                url: rpc_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(Arc::new(provider), multicall))
    }

    /// Latest block height reported by the node
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map(|block| block.as_u64())
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl ChainReader for EthersChainReader {
    async fn get_pair(
        &self,
        factory: Address,
        token0: Address,
        token1: Address,
    ) -> Result<Address, ChainError> {
        let request = TransactionRequest::new()
            .to(factory)
            .data(abi::encode_get_pair(token0, token1)?);

        let output = self
            .provider
            .call(&request.into(), None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(abi::decode_get_pair(&output)?)
    }

    async fn aggregate(&self, calls: Vec<Call>, block: u64) -> Result<Vec<Vec<u8>>, ChainError> {
        let call_count = calls.len();
        let request = TransactionRequest::new()
            .to(self.multicall)
            .data(abi::encode_aggregate(&calls)?);
        let at = BlockId::Number(BlockNumber::Number(U64::from(block)));

        let output = self
            .provider
            .call(&request.into(), Some(at))
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        let (executed_at, results) = abi::decode_aggregate(&output)?;
        debug!(
            calls = call_count,
            results = results.len(),
            block = %executed_at,
            "Aggregate call completed"
        );
        Ok(results)
    }
}

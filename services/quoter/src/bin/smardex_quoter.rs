//! SmarDex Quoter
//!
//! Quotes one token pair at a block and prints the price curve as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use smardex_amm::{Address, SwapSide, U256};
use smardex_config::{load_config, service::loader};
use smardex_dex::EthersChainReader;
use smardex_quoter::{QuoteRequest, SmardexPriceSource, SystemClock, Token};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    Sell,
    Buy,
}

impl From<Side> for SwapSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Sell => SwapSide::Sell,
            Side::Buy => SwapSide::Buy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "smardex_quoter", about = "Quote a SmarDex pair at a block")]
struct Args {
    /// Base configuration file
    #[arg(long, default_value = loader::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Environment overlay under `environments/`
    #[arg(long)]
    environment: Option<String>,

    #[arg(long, default_value = "ethereum")]
    network: String,

    #[arg(long)]
    from: String,

    #[arg(long)]
    from_decimals: u8,

    #[arg(long)]
    to: String,

    #[arg(long)]
    to_decimals: u8,

    #[arg(long, value_enum, default_value_t = Side::Sell)]
    side: Side,

    /// Amounts in base units, decimal
    #[arg(long = "amount", required = true, num_args = 1..)]
    amounts: Vec<String>,

    /// Block to quote at, latest when omitted
    #[arg(long)]
    block: Option<u64>,
}

fn parse_address(value: &str) -> Result<Address> {
    value
        .parse::<Address>()
        .map_err(|e| anyhow!("invalid address {value}: {e}"))
}

fn parse_amount(value: &str) -> Result<U256> {
    U256::from_dec_str(value).map_err(|e| anyhow!("invalid amount {value}: {e:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smardex_quoter=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = load_config(Some(&args.config), args.environment.as_deref())
        .with_context(|| format!("loading {}", args.config.display()))?;
    let network = config.network(&args.network)?;

    let reader = Arc::new(EthersChainReader::connect(
        &network.rpc_url,
        network.multicall_address,
    )?);
    let block_number = match args.block {
        Some(block) => block,
        None => reader.block_number().await?,
    };

    info!(
        network = %args.network,
        chain_id = network.chain_id,
        block = block_number,
        "Quoting SmarDex pair"
    );

    let source = SmardexPriceSource::from_network(network, reader, Arc::new(SystemClock));

    let amounts = args
        .amounts
        .iter()
        .map(|amount| parse_amount(amount))
        .collect::<Result<Vec<_>>>()?;
    let request = QuoteRequest::new(
        Token::new(parse_address(&args.from)?, args.from_decimals),
        Token::new(parse_address(&args.to)?, args.to_decimals),
        args.side.into(),
        amounts,
        block_number,
    );

    match source.try_quote(&request).await {
        Ok(prices) => {
            println!("{}", serde_json::to_string_pretty(&prices)?);
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "No quote available");
            Err(e.into())
        }
    }
}

use super::retry::RetryPolicy;
use ethers::types::{Address, U256};

/// Contract addresses the pipeline talks to.
#[derive(Debug, Clone, Copy)]
pub struct Contracts {
    pub wrapped_native: Address,
    pub quoter: Address,
    pub router: Address,
}

/// Where the legacy gas price comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPriceSource {
    Fixed(U256),
    /// Ask the node (`eth_gasPrice`) before every transaction.
    Network,
}

#[derive(Debug, Clone, Copy)]
pub struct GasSettings {
    pub price: GasPriceSource,
    /// Gas limit for wrap and approve.
    pub fixed_limit: U256,
    /// Added on top of the swap's gas estimate.
    pub estimate_margin_percent: u32,
}

/// Static parameters of a [`WalletTxPipeline`](super::WalletTxPipeline).
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub contracts: Contracts,
    pub gas: GasSettings,
    pub retry: RetryPolicy,
    /// Fee tier of the pool the swap routes through (500 = 0.05%).
    pub pool_fee: u32,
    pub swap_deadline_secs: u64,
    /// Re-read the pending nonce from the node before retrying a failed submission.
    pub resync_nonce_on_retry: bool,
    /// Prefix for explorer links, e.g. `https://explorer/tx/`.
    pub explorer_tx_url: Option<String>,
}

/// Per-run parameters shared by all wallets.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Native amount to wrap and swap, in wei.
    pub amount_in: U256,
    pub token_out: Address,
    pub slippage: crate::models::Slippage,
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
}

//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use crate::models::{Slippage, TargetToken};
use crate::pipeline::{
    Contracts, GasPriceSource, GasSettings, PipelineSettings, RetryPolicy, RunPlan,
};
use ethers::{
    types::{Address, U256},
    utils::{parse_ether, parse_units},
};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const DEFAULT_RPC_URL: &str = "https://testnet.dplabs-internal.com/";
const DEFAULT_WRAPPED_NATIVE: &str = "0x76aaaDA469D23216bE5f7C596fA25F282Ff9b364";
const DEFAULT_USDC: &str = "0x72df0bcd7276f2dFbAc900D1CE63c272C4BCcCED";
const DEFAULT_USDT: &str = "0xD4071393f8716661958F766DF660033b3d35fD29";
const DEFAULT_ROUTER: &str = "0x1A4DE519154Ae51200b0Ad7c90F7faC75547888a";
const DEFAULT_QUOTER: &str = "0x00f2f47d1ed593Cf0AF0074173E9DF95afb0206C";
const DEFAULT_EXPLORER_TX_URL: &str = "https://testnet.pharosscan.xyz/tx/";

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP JSON-RPC endpoint.
    pub rpc_url: String,
    /// File holding one private key per line.
    pub keys_file: String,
    /// Native amount to wrap and swap per wallet, in wei.
    pub swap_amount: U256,
    pub target: TargetToken,
    pub slippage: Slippage,
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub wrapped_native: Address,
    pub usdc: Address,
    pub usdt: Address,
    pub router: Address,
    pub quoter: Address,
    pub pool_fee: u32,
    pub gas_price: GasPriceSource,
    pub gas_limit: U256,
    pub gas_margin_percent: u32,
    pub swap_deadline_secs: u64,
    pub retry: RetryPolicy,
    pub resync_nonce_on_retry: bool,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub explorer_tx_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let rpc_url = or("RPC_URL", DEFAULT_RPC_URL);
        Url::parse(&rpc_url)?;

        let swap_amount = get("SWAP_AMOUNT").ok_or_else(|| {
            AppError::Config("SWAP_AMOUNT is required (native units per wallet)".into())
        })?;
        let swap_amount = parse_ether(&swap_amount)?;
        if swap_amount.is_zero() {
            return Err(AppError::Config("SWAP_AMOUNT must be greater than zero".into()));
        }

        let min_delay_secs: u64 = or("MIN_DELAY_SECS", "0").parse()?;
        let max_delay_secs: u64 = or("MAX_DELAY_SECS", "0").parse()?;

        let gas_price = match or("GAS_PRICE_GWEI", "2").to_ascii_lowercase().as_str() {
            "auto" => GasPriceSource::Network,
            gwei => GasPriceSource::Fixed(parse_units(gwei, "gwei")?.into()),
        };

        let max_attempts = match get("RETRY_MAX_ATTEMPTS") {
            Some(raw) => Some(raw.parse::<u32>()?).filter(|n| *n > 0),
            None => None,
        };
        let backoff_factor: f64 = or("RETRY_BACKOFF_FACTOR", "1")
            .parse()
            .map_err(|_| AppError::Config("RETRY_BACKOFF_FACTOR must be a number".into()))?;
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(AppError::Config("RETRY_BACKOFF_FACTOR must be >= 1".into()));
        }
        let retry = RetryPolicy {
            delay: Duration::from_secs(or("RETRY_DELAY_SECS", "10").parse()?),
            backoff_factor,
            max_delay: Duration::from_secs(or("RETRY_MAX_DELAY_SECS", "300").parse()?),
            max_attempts,
        };

        let pool_fee: u32 = or("POOL_FEE", "500").parse()?;
        if pool_fee > 0x00ff_ffff {
            return Err(AppError::Config(format!("POOL_FEE {pool_fee} does not fit in uint24")));
        }

        let explorer_tx_url = match lookup("EXPLORER_TX_URL") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(DEFAULT_EXPLORER_TX_URL.to_string()),
        };

        Ok(Self {
            rpc_url,
            keys_file: or("KEYS_FILE", "pvt.txt"),
            swap_amount,
            target: or("TARGET_TOKEN", "usdc").parse()?,
            slippage: Slippage::from_percent_str(&or("SLIPPAGE_PERCENT", "5"))?,
            min_delay_secs,
            max_delay_secs,
            wrapped_native: address_var(&get, "WRAPPED_NATIVE_ADDRESS", DEFAULT_WRAPPED_NATIVE)?,
            usdc: address_var(&get, "USDC_ADDRESS", DEFAULT_USDC)?,
            usdt: address_var(&get, "USDT_ADDRESS", DEFAULT_USDT)?,
            router: address_var(&get, "ROUTER_ADDRESS", DEFAULT_ROUTER)?,
            quoter: address_var(&get, "QUOTER_ADDRESS", DEFAULT_QUOTER)?,
            pool_fee,
            gas_price,
            gas_limit: U256::from(or("GAS_LIMIT", "100000").parse::<u64>()?),
            gas_margin_percent: or("GAS_MARGIN_PERCENT", "20").parse()?,
            swap_deadline_secs: or("SWAP_DEADLINE_SECS", "600").parse()?,
            retry,
            resync_nonce_on_retry: parse_bool(&or("RESYNC_NONCE_ON_RETRY", "false"))?,
            receipt_timeout: Duration::from_secs(or("RECEIPT_TIMEOUT_SECS", "120").parse()?),
            receipt_poll_interval: Duration::from_millis(or("RECEIPT_POLL_MS", "1000").parse()?),
            explorer_tx_url,
        })
    }

    /// Address of the stable token selected by `TARGET_TOKEN`.
    pub fn token_out(&self) -> Address {
        match self.target {
            TargetToken::Usdc => self.usdc,
            TargetToken::Usdt => self.usdt,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            contracts: Contracts {
                wrapped_native: self.wrapped_native,
                quoter: self.quoter,
                router: self.router,
            },
            gas: GasSettings {
                price: self.gas_price,
                fixed_limit: self.gas_limit,
                estimate_margin_percent: self.gas_margin_percent,
            },
            retry: self.retry.clone(),
            pool_fee: self.pool_fee,
            swap_deadline_secs: self.swap_deadline_secs,
            resync_nonce_on_retry: self.resync_nonce_on_retry,
            explorer_tx_url: self.explorer_tx_url.clone(),
        }
    }

    pub fn run_plan(&self) -> RunPlan {
        RunPlan {
            amount_in: self.swap_amount,
            token_out: self.token_out(),
            slippage: self.slippage,
            min_delay_secs: self.min_delay_secs,
            max_delay_secs: self.max_delay_secs.max(self.min_delay_secs),
        }
    }
}

fn address_var(get: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> Result<Address> {
    let raw = get(name).unwrap_or_else(|| default.to_string());
    Address::from_str(&raw)
        .map_err(|e| AppError::Config(format!("{name}: invalid address '{raw}': {e}")))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("expected a boolean, got '{other}'"))),
    }
}

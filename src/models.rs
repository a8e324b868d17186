//! Shared data structures used throughout the application.

use crate::errors::{AppError, Result};
use bigdecimal::BigDecimal;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, H256, U256, U512},
};
use num_traits::ToPrimitive;
use std::fmt;
use std::str::FromStr;

/// Finer slippage than this many decimals of a percent is rejected.
const MAX_SLIPPAGE_DECIMALS: i64 = 18;

/// A signing key together with the address derived from it.
#[derive(Debug, Clone)]
pub struct Wallet {
    pub signer: LocalWallet,
    pub address: Address,
}

impl Wallet {
    /// Parse a hex private key (with or without `0x`) and bind it to `chain_id`.
    pub fn from_key(key: &str, chain_id: u64) -> Result<Self> {
        let signer = LocalWallet::from_str(key.trim())?.with_chain_id(chain_id);
        let address = signer.address();
        Ok(Self { signer, address })
    }
}

/// Quote for an exact-input single-hop swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub token_in: Address,
    pub token_out: Address,
    /// Pool fee tier in hundredths of a bip (500 = 0.05%).
    pub fee: u32,
    pub amount_in: U256,
    /// Zero when the quoter call failed.
    pub amount_out: U256,
}

/// Stable token the wrapped native asset is swapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetToken {
    Usdc,
    Usdt,
}

impl FromStr for TargetToken {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "usdc" => Ok(Self::Usdc),
            "2" | "usdt" => Ok(Self::Usdt),
            other => Err(AppError::Config(format!(
                "unknown target token '{other}', expected usdc or usdt"
            ))),
        }
    }
}

impl fmt::Display for TargetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usdc => f.write_str("USDC"),
            Self::Usdt => f.write_str("USDT"),
        }
    }
}

/// Slippage tolerance as an exact decimal percent, `units / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slippage {
    units: U256,
    scale: u32,
}

impl Slippage {
    /// Parse a decimal percentage such as `"5"`, `"0.5"` or `"5.555"`.
    pub fn from_percent_str(raw: &str) -> Result<Self> {
        let pct = BigDecimal::from_str(raw.trim())?.normalized();
        if pct < BigDecimal::from(0u32) || pct > BigDecimal::from(100u32) {
            return Err(AppError::Config(format!(
                "slippage of {pct}% is outside 0..=100"
            )));
        }
        let (digits, exponent) = pct.as_bigint_and_exponent();
        if exponent > MAX_SLIPPAGE_DECIMALS {
            return Err(AppError::Config(format!(
                "slippage '{raw}' has more than {MAX_SLIPPAGE_DECIMALS} decimal places"
            )));
        }
        let digits = digits
            .to_u128()
            .ok_or_else(|| AppError::Config(format!("invalid slippage percent '{raw}'")))?;
        let mut units = U256::from(digits);
        if exponent < 0 {
            units *= U256::exp10(exponent.unsigned_abs() as usize);
        }
        Ok(Self {
            units,
            scale: exponent.max(0) as u32,
        })
    }

    /// `floor(quoted * (100 - percent) / 100)`, zero when the quote is zero.
    pub fn min_amount_out(&self, quoted: U256) -> U256 {
        if quoted.is_zero() {
            return U256::zero();
        }
        let whole = U256::from(100u32) * U256::exp10(self.scale as usize);
        let keep = whole - self.units;
        let out = quoted.full_mul(keep) / U512::from(whole);
        // never above `quoted`, so it fits
        U256::try_from(out).unwrap_or(quoted)
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = U256::exp10(self.scale as usize);
        let whole = self.units / unit;
        if self.scale == 0 {
            return write!(f, "{whole}%");
        }
        let frac = (self.units % unit).to_string();
        write!(f, "{whole}.{frac:0>width$}%", width = self.scale as usize)
    }
}

/// Hash and inclusion block of a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: H256,
    pub block: Option<u64>,
}

/// What happened to a single wallet during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletOutcome {
    /// Balance below the requested amount; nothing was sent.
    Skipped { address: Address, balance: U256 },
    Completed {
        address: Address,
        wrap: H256,
        approve: Option<H256>,
        swap: H256,
        quote: SwapQuote,
        min_amount_out: U256,
    },
}

impl WalletOutcome {
    /// Number of state-changing transactions the wallet sent.
    pub fn transaction_count(&self) -> usize {
        match self {
            Self::Skipped { .. } => 0,
            Self::Completed { approve, .. } => 2 + usize::from(approve.is_some()),
        }
    }
}

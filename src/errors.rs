use ethers::types::H256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse int error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Decimal parse error: {0}")]
    ParseDecimal(#[from] bigdecimal::ParseBigDecimalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Provider error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("ABI error: {0}")]
    Abi(#[from] ethers::abi::AbiError),

    #[error("Unit conversion error: {0}")]
    Units(#[from] ethers::utils::ConversionError),

    #[error("Transaction {hash:?} failed: {reason}")]
    Transaction { hash: H256, reason: String },

    #[error("Timed out waiting for receipt of {0:?}")]
    ReceiptTimeout(H256),

    #[error("{operation} gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        last_error: String,
    },

    #[error("Other: {0}")]
    Other(String),
}

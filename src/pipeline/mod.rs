pub mod nonce;
pub mod retry;
pub mod types;
pub mod wallet;

pub use nonce::NonceBook;
pub use retry::RetryPolicy;
pub use types::{Contracts, GasPriceSource, GasSettings, PipelineSettings, RunPlan};
pub use wallet::WalletTxPipeline;

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{
        Address, BlockId, BlockNumber, Bytes, H256, TransactionReceipt, U256,
        transaction::eip2718::TypedTransaction,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Everything the wallet pipeline needs from a JSON-RPC node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;
    async fn balance(&self, address: Address) -> Result<U256>;
    /// Transaction count including transactions still in the mempool.
    async fn pending_nonce(&self, address: Address) -> Result<u64>;
    async fn gas_price(&self) -> Result<U256>;
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes>;
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256>;
    /// Sign `tx` with `signer` and broadcast the raw bytes.
    async fn send_signed(&self, signer: &LocalWallet, tx: TypedTransaction) -> Result<H256>;
    /// Block until the transaction is mined.
    async fn wait_for_receipt(&self, hash: H256) -> Result<TransactionReceipt>;
}

/// `ChainClient` over an HTTP JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcChain {
    provider: Arc<Provider<Http>>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl RpcChain {
    pub fn new(rpc_url: &str, receipt_timeout: Duration, poll_interval: Duration) -> Result<Self> {
        let provider = Arc::new(Provider::<Http>::try_from(rpc_url)?);
        Ok(Self {
            provider,
            receipt_timeout,
            poll_interval,
        })
    }

    /// Connect and make sure the node answers.
    pub async fn connect(
        rpc_url: &str,
        receipt_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        let chain = Self::new(rpc_url, receipt_timeout, poll_interval)?;
        chain.provider.get_block_number().await?; // sanity-check
        Ok(chain)
    }
}

#[async_trait]
impl ChainClient for RpcChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chainid().await?.as_u64())
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address, None).await?)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let block: BlockId = BlockNumber::Pending.into();
        let count = self
            .provider
            .get_transaction_count(address, Some(block))
            .await?;
        Ok(count.as_u64())
    }

    async fn gas_price(&self) -> Result<U256> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        Ok(self.provider.call(tx, None).await?)
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256> {
        Ok(self.provider.estimate_gas(tx, None).await?)
    }

    async fn send_signed(&self, signer: &LocalWallet, tx: TypedTransaction) -> Result<H256> {
        let signature = signer.sign_transaction(&tx).await?;
        let raw = tx.rlp_signed(&signature);
        let pending = self.provider.send_raw_transaction(raw).await?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: H256) -> Result<TransactionReceipt> {
        let pending =
            PendingTransaction::new(hash, self.provider.as_ref()).interval(self.poll_interval);
        match tokio::time::timeout(self.receipt_timeout, pending).await {
            Ok(Ok(Some(receipt))) => Ok(receipt),
            Ok(Ok(None)) => {
                debug!(?hash, "[RPC] transaction disappeared while waiting for receipt");
                Err(AppError::Transaction {
                    hash,
                    reason: "dropped from mempool".into(),
                })
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(AppError::ReceiptTimeout(hash)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        let res = RpcChain::new("not a url", Duration::from_secs(1), Duration::from_millis(10));
        assert!(matches!(res, Err(AppError::UrlParse(_))));
    }

    #[test]
    fn accepts_http_url_without_network_io() {
        let res = RpcChain::new(
            "http://127.0.0.1:8545",
            Duration::from_secs(1),
            Duration::from_millis(10),
        );
        assert!(res.is_ok());
    }
}

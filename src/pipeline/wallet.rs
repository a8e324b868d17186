//! Per-wallet wrap → quote → approve → swap sequence.

use super::nonce::NonceBook;
use super::types::{GasPriceSource, PipelineSettings};
use crate::dex::{
    AllowanceCall, ApproveCall, ChainClient, DepositCall, QuoteExactInputCall, apply_gas_margin,
    encode_exact_input_single, encode_path, encode_swap_multicall, swap_deadline,
};
use crate::errors::{AppError, Result};
use crate::models::{Slippage, SwapQuote, TxOutcome, Wallet, WalletOutcome};
use ethers::{
    abi::{AbiDecode, AbiEncode},
    types::{
        Address, Bytes, H256, TransactionRequest, U64, U256,
        transaction::eip2718::TypedTransaction,
    },
    utils::format_ether,
};
use tracing::{info, warn};

/// Drives the transaction sequence for one wallet at a time.
///
/// Every state-changing step is retried under `settings.retry`; with the default
/// policy a step only returns once its transaction has been mined successfully.
pub struct WalletTxPipeline<C> {
    chain: C,
    settings: PipelineSettings,
    chain_id: u64,
    nonces: NonceBook,
}

impl<C: ChainClient> WalletTxPipeline<C> {
    /// Read the chain id from the node and build the pipeline.
    pub async fn connect(chain: C, settings: PipelineSettings) -> Result<Self> {
        let chain_id = chain.chain_id().await?;
        if let Some(max) = settings.retry.max_attempts {
            warn!(
                max_attempts = max,
                "[INIT] bounded retries enabled; a wallet is abandoned once a step exhausts them"
            );
        }
        if settings.resync_nonce_on_retry {
            info!("[INIT] nonce will be re-read from the node before each retry");
        }
        info!(chain_id, "[INIT] pipeline ready");
        Ok(Self::with_chain_id(chain, settings, chain_id))
    }

    pub fn with_chain_id(chain: C, settings: PipelineSettings, chain_id: u64) -> Self {
        Self {
            chain,
            settings,
            chain_id,
            nonces: NonceBook::new(),
        }
    }

    pub fn nonces(&self) -> &NonceBook {
        &self.nonces
    }

    // ---------- operations ----------

    /// Native balance of `address`.
    pub async fn check_balance(&self, address: Address) -> Result<U256> {
        self.settings
            .retry
            .run("balance", || self.chain.balance(address))
            .await
    }

    /// Start tracking `address` from its pending transaction count.
    pub async fn seed_nonce(&mut self, address: Address) -> Result<u64> {
        let pending = self
            .settings
            .retry
            .run("nonce", || self.chain.pending_nonce(address))
            .await?;
        self.nonces.seed(address, pending);
        Ok(pending)
    }

    /// Deposit `amount` of native currency into the wrapped-token contract.
    pub async fn wrap_native(&mut self, wallet: &Wallet, amount: U256) -> Result<H256> {
        let mut attempt = 1;
        loop {
            match self.try_wrap(wallet, amount).await {
                Ok(outcome) => {
                    info!(
                        amount = %format_ether(amount),
                        block = ?outcome.block,
                        "[WRAP] native wrapped"
                    );
                    return Ok(outcome.hash);
                }
                Err(e) => {
                    self.settings.retry.pause_or_give_up("wrap", attempt, e).await?;
                    self.resync_nonce(wallet.address).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Approve `spender` for the maximum amount unless the current allowance
    /// already covers `required`.
    pub async fn ensure_allowance(
        &mut self,
        wallet: &Wallet,
        token: Address,
        spender: Address,
        required: U256,
    ) -> Result<Option<H256>> {
        let mut attempt = 1;
        loop {
            match self.try_approve(wallet, token, spender, required).await {
                Ok(outcome) => return Ok(outcome.map(|o| o.hash)),
                Err(e) => {
                    self.settings
                        .retry
                        .pause_or_give_up("approve", attempt, e)
                        .await?;
                    self.resync_nonce(wallet.address).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Quoted output for swapping `amount_in`; zero when the quoter call fails.
    pub async fn quote_swap(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        fee: u32,
    ) -> U256 {
        match self.try_quote(token_in, token_out, amount_in, fee).await {
            Ok(amount_out) => {
                info!(amount_out = %amount_out, "[QUOTE] quoter answered");
                amount_out
            }
            Err(e) => {
                warn!(error = %e, "[QUOTE] quoter failed; swapping without a minimum output");
                U256::zero()
            }
        }
    }

    /// Swap `amount_in` of the wrapped token into `token_out` through the router.
    pub async fn execute_swap(
        &mut self,
        wallet: &Wallet,
        token_out: Address,
        amount_in: U256,
        min_out: U256,
        fee: u32,
    ) -> Result<H256> {
        let mut attempt = 1;
        loop {
            match self
                .try_swap(wallet, token_out, amount_in, min_out, fee)
                .await
            {
                Ok(outcome) => {
                    if let Some(base) = &self.settings.explorer_tx_url {
                        info!("[SWAP] explorer: {base}{:?}", outcome.hash);
                    }
                    return Ok(outcome.hash);
                }
                Err(e) => {
                    self.settings.retry.pause_or_give_up("swap", attempt, e).await?;
                    self.resync_nonce(wallet.address).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the full sequence for the wallet behind `key`.
    pub async fn process_wallet(
        &mut self,
        key: &str,
        native_amount: U256,
        token_out: Address,
        slippage: Slippage,
    ) -> Result<WalletOutcome> {
        let wallet = Wallet::from_key(key, self.chain_id)?;
        let address = wallet.address;
        info!(address = ?address, "[WALLET] ========== processing wallet ==========");

        let nonce = self.seed_nonce(address).await?;
        let balance = self.check_balance(address).await?;
        info!(balance = %format_ether(balance), nonce, "[WALLET] balance");

        if balance < native_amount {
            warn!(
                balance = %format_ether(balance),
                required = %format_ether(native_amount),
                "[WALLET] insufficient native balance; skipping"
            );
            return Ok(WalletOutcome::Skipped { address, balance });
        }

        let contracts = self.settings.contracts;
        let fee = self.settings.pool_fee;

        let wrap = self.wrap_native(&wallet, native_amount).await?;

        let amount_out = self
            .quote_swap(contracts.wrapped_native, token_out, native_amount, fee)
            .await;
        let quote = SwapQuote {
            token_in: contracts.wrapped_native,
            token_out,
            fee,
            amount_in: native_amount,
            amount_out,
        };
        let min_amount_out = slippage.min_amount_out(amount_out);
        info!(
            quoted = %amount_out,
            min_out = %min_amount_out,
            slippage = %slippage,
            "[QUOTE] minimum output"
        );

        let approve = self
            .ensure_allowance(
                &wallet,
                contracts.wrapped_native,
                contracts.router,
                native_amount,
            )
            .await?;
        let swap = self
            .execute_swap(&wallet, token_out, native_amount, min_amount_out, fee)
            .await?;

        Ok(WalletOutcome::Completed {
            address,
            wrap,
            approve,
            swap,
            quote,
            min_amount_out,
        })
    }

    // ---------- single attempts ----------

    async fn try_wrap(&mut self, wallet: &Wallet, amount: U256) -> Result<TxOutcome> {
        let nonce = self.nonces.current(wallet.address)?;
        let gas_price = self.gas_price().await?;
        let tx = self.legacy_tx(
            wallet.address,
            self.settings.contracts.wrapped_native,
            DepositCall::default().encode().into(),
            amount,
            nonce,
            Some(self.settings.gas.fixed_limit),
            gas_price,
        );
        self.submit(wallet, tx, "WRAP").await
    }

    async fn try_approve(
        &mut self,
        wallet: &Wallet,
        token: Address,
        spender: Address,
        required: U256,
    ) -> Result<Option<TxOutcome>> {
        let current = self.allowance(token, wallet.address, spender).await?;
        if current >= required {
            info!(allowance = %current, "[APPROVE] allowance already sufficient");
            return Ok(None);
        }

        let nonce = self.nonces.current(wallet.address)?;
        let gas_price = self.gas_price().await?;
        let data = ApproveCall {
            spender,
            amount: U256::MAX,
        }
        .encode();
        let tx = self.legacy_tx(
            wallet.address,
            token,
            data.into(),
            U256::zero(),
            nonce,
            Some(self.settings.gas.fixed_limit),
            gas_price,
        );
        self.submit(wallet, tx, "APPROVE").await.map(Some)
    }

    async fn try_quote(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        fee: u32,
    ) -> Result<U256> {
        let data = QuoteExactInputCall {
            path: encode_path(token_in, fee, token_out),
            amount_in,
        }
        .encode();
        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.settings.contracts.quoter)
            .data(data)
            .into();
        let out = self.chain.call(&tx).await?;
        Ok(U256::decode(out)?)
    }

    async fn try_swap(
        &mut self,
        wallet: &Wallet,
        token_out: Address,
        amount_in: U256,
        min_out: U256,
        fee: u32,
    ) -> Result<TxOutcome> {
        let call = encode_exact_input_single(
            self.settings.contracts.wrapped_native,
            token_out,
            fee,
            wallet.address,
            amount_in,
            min_out,
        );
        let data = encode_swap_multicall(swap_deadline(self.settings.swap_deadline_secs), call);

        let nonce = self.nonces.current(wallet.address)?;
        let gas_price = self.gas_price().await?;
        let mut tx = self.legacy_tx(
            wallet.address,
            self.settings.contracts.router,
            data,
            U256::zero(),
            nonce,
            None,
            gas_price,
        );
        let estimate = self.chain.estimate_gas(&tx).await?;
        let gas = apply_gas_margin(estimate, self.settings.gas.estimate_margin_percent);
        tx.set_gas(gas);
        self.submit(wallet, tx, "SWAP").await
    }

    // ---------- helpers ----------

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let data = AllowanceCall { owner, spender }.encode();
        let tx: TypedTransaction = TransactionRequest::new().to(token).data(data).into();
        let out = self.chain.call(&tx).await?;
        Ok(U256::decode(out)?)
    }

    async fn gas_price(&self) -> Result<U256> {
        match self.settings.gas.price {
            GasPriceSource::Fixed(price) => Ok(price),
            GasPriceSource::Network => self.chain.gas_price().await,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn legacy_tx(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        value: U256,
        nonce: u64,
        gas: Option<U256>,
        gas_price: U256,
    ) -> TypedTransaction {
        let mut request = TransactionRequest::new()
            .from(from)
            .to(to)
            .data(data)
            .value(value)
            .nonce(nonce)
            .gas_price(gas_price)
            .chain_id(self.chain_id);
        if let Some(gas) = gas {
            request = request.gas(gas);
        }
        request.into()
    }

    /// Sign, broadcast and wait for `tx`. The sender's nonce advances once the
    /// receipt is in, whether or not the transaction reverted.
    async fn submit(
        &mut self,
        wallet: &Wallet,
        tx: TypedTransaction,
        tag: &str,
    ) -> Result<TxOutcome> {
        let nonce = tx.nonce().map(|n| n.as_u64()).unwrap_or_default();
        let hash = self.chain.send_signed(&wallet.signer, tx).await?;
        info!(tx_hash = ?hash, nonce, "[{tag}] tx sent");

        let receipt = self.chain.wait_for_receipt(hash).await?;
        self.nonces.confirm(wallet.address)?;
        let block = receipt.block_number.map(|b| b.as_u64());

        if receipt.status == Some(U64::zero()) {
            return Err(AppError::Transaction {
                hash,
                reason: format!("reverted in block {block:?}"),
            });
        }
        info!(tx_hash = ?hash, block = ?block, "[{tag}] tx confirmed");
        Ok(TxOutcome { hash, block })
    }

    async fn resync_nonce(&mut self, address: Address) {
        if !self.settings.resync_nonce_on_retry {
            return;
        }
        match self.chain.pending_nonce(address).await {
            Ok(pending) => {
                let local = self.nonces.current(address).ok();
                if local != Some(pending) {
                    warn!(?local, pending, "[RETRY] local nonce differs from node; resyncing");
                }
                self.nonces.seed(address, pending);
            }
            Err(e) => warn!(error = %e, "[RETRY] nonce resync failed; keeping local nonce"),
        }
    }
}

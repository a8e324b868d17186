//! Walks the key list, one wallet at a time, with a random pause in between.

use crate::{
    dex::ChainClient,
    models::WalletOutcome,
    pipeline::{RunPlan, WalletTxPipeline},
};
use rand::Rng;
use std::time::Duration;
use tracing::{error, info};

/// Tally of a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Uniform pause in `[min_secs, max_secs]`; `max_secs` below `min_secs` is raised to it.
pub fn pick_delay<R: Rng>(rng: &mut R, min_secs: u64, max_secs: u64) -> Duration {
    let max_secs = max_secs.max(min_secs);
    if max_secs == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs(rng.gen_range(min_secs..=max_secs))
}

/// Process every key in order. A wallet that errors out is counted and the run
/// moves on to the next key.
pub async fn run_wallets<C: ChainClient, R: Rng>(
    pipeline: &mut WalletTxPipeline<C>,
    keys: &[String],
    plan: &RunPlan,
    rng: &mut R,
) -> RunSummary {
    let mut summary = RunSummary::default();
    info!(
        wallets = keys.len(),
        amount = %ethers::utils::format_ether(plan.amount_in),
        token_out = ?plan.token_out,
        slippage = %plan.slippage,
        "[RUN] starting"
    );

    for (idx, key) in keys.iter().enumerate() {
        let result = pipeline
            .process_wallet(key, plan.amount_in, plan.token_out, plan.slippage)
            .await;
        match result {
            Ok(WalletOutcome::Skipped { .. }) => summary.skipped += 1,
            Ok(outcome @ WalletOutcome::Completed { .. }) => {
                info!(
                    wallet = idx + 1,
                    transactions = outcome.transaction_count(),
                    "[WALLET] done"
                );
                summary.completed += 1;
            }
            Err(e) => {
                error!(wallet = idx + 1, error = %e, "[WALLET] abandoned");
                summary.failed += 1;
            }
        }

        if idx + 1 < keys.len() {
            let delay = pick_delay(rng, plan.min_delay_secs, plan.max_delay_secs);
            if !delay.is_zero() {
                info!("[DELAY] waiting {}s before next wallet", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        }
    }

    info!(
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        "[RUN] finished"
    );
    summary
}

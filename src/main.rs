use anyhow::Result;
use wrap_swap_runner::{
    config::AppConfig,
    dex::RpcChain,
    pipeline::WalletTxPipeline,
    runner, utils,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    let keys = utils::load_keys(&config.keys_file)?;
    tracing::info!(
        wallets = keys.len(),
        rpc_url = %config.rpc_url,
        target = %config.target,
        "[INIT] wrap-swap-runner starting"
    );

    let chain = RpcChain::connect(
        &config.rpc_url,
        config.receipt_timeout,
        config.receipt_poll_interval,
    )
    .await
    .map_err(|e| anyhow::anyhow!("RPC not reachable at {}: {e}", config.rpc_url))?;
    let mut pipeline = WalletTxPipeline::connect(chain, config.pipeline_settings()).await?;

    let plan = config.run_plan();
    let summary = runner::run_wallets(&mut pipeline, &keys, &plan, &mut rand::thread_rng()).await;
    if summary.failed > 0 {
        tracing::warn!(failed = summary.failed, "[RUN] some wallets were abandoned");
    }
    Ok(())
}

use anyhow::Context;
use feeshare::{
    write_report, AppError, Config, FeeShareRunner, HttpPriceSource, PriceSource, RpcChainReader,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<AppError>()
            .map(AppError::exit_code)
            .unwrap_or(1);
        eprintln!("{:#}", e);
        std::process::exit(code);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().map_err(AppError::from)?;

    let reader = RpcChainReader::connect(&config.rpc_url, config.chain_id, config.read_timeout())
        .await
        .map_err(AppError::from)
        .with_context(|| format!("connecting to {}", config.rpc_url))?;
    let prices: Arc<dyn PriceSource> = Arc::new(
        HttpPriceSource::new(config.price_endpoints.clone(), config.read_timeout())
            .map_err(AppError::from)?,
    );

    let report = FeeShareRunner::new(Arc::new(reader), prices, config.clone())
        .run()
        .await
        .map_err(AppError::from)?;

    println!("--------------------------------------------------");
    println!(
        "Rewards due for wallet {} from {} to {}:",
        config.user_address, config.start_datetime, config.end_datetime
    );
    println!("--------------------------------------------------");
    for pool in &report.pools {
        println!(
            "PID: {}, LP Address: {}, Stake Amount: {}",
            pool.pid, pool.lp_address, pool.stake_amount
        );
        println!("Rewards For LP: {} ::", pool.lp_name);
        for leg in [&pool.token0, &pool.token1] {
            println!("User Fees in {} ({}): {}", leg.name, leg.symbol, leg.fees_normalised);
            if let Some(usd) = leg.fees_usd {
                println!("User Fees in {} (USD): ${}", leg.name, usd.round_dp(2));
            }
        }
        println!("--------------------------------------------------");
    }
    for pool in &report.failed_pools {
        println!("PID: {} FAILED: {}", pool.pid, pool.error);
    }

    let path = write_report(&report, &config.output_dir, config.timestamp_report_file)
        .map_err(AppError::from)?;
    println!("Report written to {}", path.display());

    if !report.is_complete() {
        return Err(AppError::PartialReport {
            failed: report.failed_pools.len(),
        }
        .into());
    }
    Ok(())
}

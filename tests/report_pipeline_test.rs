//! Full run from configuration to written report, over an in-memory chain.

use alloy::primitives::Address;
use feeshare::chain::MockChainReader;
use feeshare::config::Config;
use feeshare::domain::{BlockTag, Decimal, PoolId};
use feeshare::pricing::StaticPriceSource;
use feeshare::{write_report, FeeShareRunner, RunError};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

// Jan-01-2024 00:00:00 UTC
const JAN_1_2024: i64 = 1_704_067_200;
const ONE_ETHER: u64 = 1_000_000_000_000_000_000;

fn user() -> Address {
    Address::repeat_byte(0x11)
}

fn weth() -> Address {
    Address::repeat_byte(0x01)
}

fn usdc() -> Address {
    Address::repeat_byte(0x02)
}

fn lp(pid: u8) -> Address {
    Address::repeat_byte(0xa0 + pid)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn env(output_dir: &TempDir, extra: &[(&str, &str)]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("RPC_URL".to_string(), "http://example.invalid".to_string());
    map.insert("CHAIN_ID".to_string(), "1101".to_string());
    map.insert("USER_ADDRESS".to_string(), user().to_string());
    map.insert(
        "MASTERCHEF_ADDRESS".to_string(),
        Address::repeat_byte(0xcc).to_string(),
    );
    map.insert(
        "START_DATETIME".to_string(),
        "Jan-01-2024 12:00:00 AM +UTC".to_string(),
    );
    map.insert(
        "OUTPUT_DIR".to_string(),
        output_dir.path().to_string_lossy().to_string(),
    );
    for (k, v) in extra {
        map.insert(k.to_string(), v.to_string());
    }
    map
}

/// Three registry pools: no position in pool 0, a healthy pool 1 and a pool 2 whose
/// supply read fails at its only fee event.
fn chain() -> MockChainReader {
    let mut mock = MockChainReader::new(10_000, JAN_1_2024 + 20_000)
        .with_token(weth(), "Wrapped Ether", "WETH", 18)
        .with_token(usdc(), "USD Coin", "USDC", 6);

    for pid in 0..3u8 {
        mock = mock
            .with_pool(PoolId::new(pid as u64), lp(pid))
            .with_pair(lp(pid), weth(), usdc())
            .with_token(lp(pid), &format!("Gamma WETH-USDC #{}", pid), "gLP", 18)
            .with_supply(lp(pid), 0, 100)
            .with_balance(weth(), lp(pid), 10 * ONE_ETHER)
            .with_balance(usdc(), lp(pid), 20_000_000_000);
    }

    mock.with_stake(PoolId::new(1), user(), 0, 10)
        .with_fee_event(lp(1), 100, ONE_ETHER, 2_000_000)
        .with_fee_event(lp(1), 200, ONE_ETHER, 2_000_000)
        .with_stake(PoolId::new(2), user(), 0, 5)
        .with_fee_event(lp(2), 300, ONE_ETHER, 2_000_000)
        .failing_supply_at(300)
}

fn prices() -> Arc<StaticPriceSource> {
    Arc::new(
        StaticPriceSource::new()
            .with_price("WETH", dec("2000"))
            .with_price("USDC", dec("1")),
    )
}

#[tokio::test]
async fn test_run_reports_healthy_pool_and_isolates_failure() {
    let out = TempDir::new().unwrap();
    let config = Config::from_env_map(env(&out, &[])).unwrap();

    let report = FeeShareRunner::new(Arc::new(chain()), prices(), config.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.pools.len(), 1);
    let pool = &report.pools[0];
    assert_eq!(pool.pid, "1");
    assert_eq!(pool.lp_address, lp(1));
    assert_eq!(pool.lp_name, "Gamma WETH-USDC #1");
    assert_eq!(pool.stake_amount, "10");
    assert_eq!(pool.block_range.start_block, 0);
    assert_eq!(pool.block_range.end_block, BlockTag::Latest);
    assert_eq!(pool.events_scanned, 2);
    assert_eq!(pool.token0.fees_normalised, "0.200000000000000000");
    assert_eq!(pool.token1.fees_normalised, "0.400000");
    assert_eq!(pool.token0.fees_usd, Some(dec("400")));
    assert_eq!(pool.token1.fees_usd, Some(dec("0.4")));
    assert_eq!(pool.total_fees_usd, Some(dec("400.4")));
    assert!(pool.lp_equivalent.is_some());

    assert_eq!(report.failed_pools.len(), 1);
    assert_eq!(report.failed_pools[0].pid, "2");
    assert_eq!(report.failed_pools[0].lp_address, lp(2));
    assert!(!report.is_complete());

    assert_eq!(report.totals.total_usd, dec("400.4"));
    assert_eq!(report.totals.pools_reported, 1);
    assert_eq!(report.totals.pools_failed, 1);

    let path = write_report(&report, &config.output_dir, config.timestamp_report_file).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!("rewards_{}.json", user())
    );
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["start_date"], "Jan-01-2024 12:00:00 AM +UTC");
    assert_eq!(written["end_date"], "now");
    assert_eq!(written["pools"][0]["token1"]["fees_raw"], "400000");
    assert_eq!(written["totals"]["pools_failed"], 1);
}

#[tokio::test]
async fn test_historical_run_matches_constant_when_stake_never_moved() {
    let out = TempDir::new().unwrap();
    let constant = Config::from_env_map(env(&out, &[])).unwrap();
    let historical =
        Config::from_env_map(env(&out, &[("CHECK_HISTORICAL_BALANCES", "true")])).unwrap();

    let a = FeeShareRunner::new(Arc::new(chain()), prices(), constant)
        .run()
        .await
        .unwrap();
    let b = FeeShareRunner::new(Arc::new(chain()), prices(), historical)
        .run()
        .await
        .unwrap();

    assert_eq!(a.pools[0].token0.fees_raw, b.pools[0].token0.fees_raw);
    assert_eq!(a.pools[0].token1.fees_raw, b.pools[0].token1.fees_raw);
}

#[tokio::test]
async fn test_unpriced_run_still_reports_amounts() {
    let out = TempDir::new().unwrap();
    let config = Config::from_env_map(env(&out, &[])).unwrap();

    let report = FeeShareRunner::new(
        Arc::new(chain()),
        Arc::new(StaticPriceSource::new().failing("WETH")),
        config,
    )
    .run()
    .await
    .unwrap();

    let pool = &report.pools[0];
    assert_eq!(pool.token0.fees_usd, None);
    assert_eq!(pool.token1.fees_usd, None);
    assert_eq!(pool.total_fees_usd, None);
    assert_eq!(pool.token0.fees_normalised, "0.200000000000000000");
    assert_eq!(report.totals.total_usd, Decimal::zero());
}

#[tokio::test]
async fn test_bad_window_aborts_run() {
    let out = TempDir::new().unwrap();
    let config =
        Config::from_env_map(env(&out, &[("START_DATETIME", "Jan-01-2024 00:00:00 +EST")]))
            .unwrap();

    let err = FeeShareRunner::new(Arc::new(chain()), prices(), config)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Resolve(_)));
}

#[tokio::test]
async fn test_timestamped_report_name() {
    let out = TempDir::new().unwrap();
    let config = Config::from_env_map(env(
        &out,
        &[
            ("TIMESTAMP_REWARDS_JSON", "true"),
            ("END_DATETIME", "Jan-01-2024 03:00:00 AM +UTC"),
        ],
    ))
    .unwrap();

    let report = FeeShareRunner::new(Arc::new(chain()), prices(), config.clone())
        .run()
        .await
        .unwrap();
    // Three hours after the start at 2s per block, 4_600 blocks before the head.
    assert_eq!(report.pools[0].block_range.end_block, BlockTag::Number(5_400));

    let path = write_report(&report, &config.output_dir, config.timestamp_report_file).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!(
            "rewards_{}_Jan-01-2024 12:00:00 AM +UTC_-_Jan-01-2024 03:00:00 AM +UTC.json",
            user()
        )
    );
}

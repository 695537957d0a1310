use crate::engine::{DEFAULT_BLOCK_INTERVAL_SECS, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENCY};
use crate::pricing::PriceEndpoint;
use alloy::primitives::Address;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub user_address: Address,
    /// Staking registry (MasterChef) listing the pools and user stakes.
    pub registry_address: Address,
    pub start_datetime: String,
    pub end_datetime: String,
    /// Re-read the stake at every fee event instead of reusing today's stake.
    pub historical_balances: bool,
    pub price_endpoints: HashMap<String, PriceEndpoint>,
    pub block_interval_secs: u64,
    pub max_concurrency: usize,
    pub chunk_size: usize,
    pub read_timeout_ms: u64,
    pub output_dir: PathBuf,
    pub timestamp_report_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let rpc_url = required(&env_map, "RPC_URL")?;

        let chain_id: u64 = parse_or(&env_map, "CHAIN_ID", None, "must be a valid u64")?;

        let user_address = parse_address(&env_map, "USER_ADDRESS")?;
        let registry_address = parse_address(&env_map, "MASTERCHEF_ADDRESS")?;

        let start_datetime = required(&env_map, "START_DATETIME")?;
        let end_datetime = env_map
            .get("END_DATETIME")
            .cloned()
            .unwrap_or_else(|| "now".to_string());

        let historical_balances = parse_bool(&env_map, "CHECK_HISTORICAL_BALANCES")?;

        let price_endpoints = match env_map.get("PRICE_ENDPOINTS") {
            Some(json) if !json.trim().is_empty() => serde_json::from_str(json).map_err(|e| {
                ConfigError::InvalidValue(
                    "PRICE_ENDPOINTS".to_string(),
                    format!("must be a JSON map of symbol to {{url, json_path}}: {}", e),
                )
            })?,
            _ => HashMap::new(),
        };

        let block_interval_secs: u64 = parse_or(
            &env_map,
            "BLOCK_INTERVAL_SECS",
            Some(DEFAULT_BLOCK_INTERVAL_SECS),
            "must be a valid u64",
        )?;
        if block_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "BLOCK_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let max_concurrency: usize = parse_or(
            &env_map,
            "MAX_CONCURRENCY",
            Some(DEFAULT_MAX_CONCURRENCY),
            "must be a valid usize",
        )?;
        let chunk_size: usize = parse_or(
            &env_map,
            "CHUNK_SIZE",
            Some(DEFAULT_CHUNK_SIZE),
            "must be a valid usize",
        )?;
        for (key, value) in [("MAX_CONCURRENCY", max_concurrency), ("CHUNK_SIZE", chunk_size)] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
        }

        let read_timeout_ms: u64 =
            parse_or(&env_map, "READ_TIMEOUT_MS", Some(30_000), "must be a valid u64")?;

        let output_dir = env_map
            .get("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let timestamp_report_file = parse_bool(&env_map, "TIMESTAMP_REWARDS_JSON")?;

        Ok(Config {
            rpc_url,
            chain_id,
            user_address,
            registry_address,
            start_datetime,
            end_datetime,
            historical_balances,
            price_endpoints,
            block_interval_secs,
            max_concurrency,
            chunk_size,
            read_timeout_ms,
            output_dir,
            timestamp_report_file,
        })
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

/// Parse `key`, falling back to `default` when absent. A `None` default makes it required.
fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: Option<T>,
    expected: &str,
) -> Result<T, ConfigError> {
    match (env_map.get(key), default) {
        (Some(raw), _) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string())),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(ConfigError::MissingEnv(key.to_string())),
    }
}

fn parse_address(env_map: &HashMap<String, String>, key: &str) -> Result<Address, ConfigError> {
    let raw = required(env_map, key)?;
    Address::from_str(raw.trim()).map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "must be a 0x-prefixed address".to_string())
    })
}

fn parse_bool(env_map: &HashMap<String, String>, key: &str) -> Result<bool, ConfigError> {
    match env_map
        .get(key)
        .map(|s| s.trim().to_ascii_lowercase())
        .as_deref()
    {
        None | Some("") | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be true or false, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("RPC_URL".to_string(), "http://localhost:8545".to_string());
        map.insert("CHAIN_ID".to_string(), "1101".to_string());
        map.insert(
            "USER_ADDRESS".to_string(),
            "0x1111111111111111111111111111111111111111".to_string(),
        );
        map.insert(
            "MASTERCHEF_ADDRESS".to_string(),
            "0xcccccccccccccccccccccccccccccccccccccccc".to_string(),
        );
        map.insert(
            "START_DATETIME".to_string(),
            "Jan-01-2024 12:00:00 AM +UTC".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.chain_id, 1101);
        assert_eq!(config.user_address, Address::repeat_byte(0x11));
        assert_eq!(config.registry_address, Address::repeat_byte(0xcc));
        assert_eq!(config.end_datetime, "now");
        assert!(!config.historical_balances);
        assert!(config.price_endpoints.is_empty());
        assert_eq!(config.block_interval_secs, 2);
        assert_eq!(config.max_concurrency, 16);
        assert_eq!(config.chunk_size, 32);
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(!config.timestamp_report_file);
    }

    #[test]
    fn test_missing_required() {
        for key in [
            "RPC_URL",
            "CHAIN_ID",
            "USER_ADDRESS",
            "MASTERCHEF_ADDRESS",
            "START_DATETIME",
        ] {
            let mut env_map = setup_required_env();
            env_map.remove(key);
            match Config::from_env_map(env_map) {
                Err(ConfigError::MissingEnv(s)) => assert_eq!(s, key),
                other => panic!("Expected MissingEnv for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_invalid_address() {
        let mut env_map = setup_required_env();
        env_map.insert("USER_ADDRESS".to_string(), "0x123".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "USER_ADDRESS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_chain_id() {
        let mut env_map = setup_required_env();
        env_map.insert("CHAIN_ID".to_string(), "polygon".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "CHAIN_ID"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("CHUNK_SIZE".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "CHUNK_SIZE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_bool_flags() {
        let mut env_map = setup_required_env();
        env_map.insert("CHECK_HISTORICAL_BALANCES".to_string(), "TRUE".to_string());
        env_map.insert("TIMESTAMP_REWARDS_JSON".to_string(), "1".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(config.historical_balances);
        assert!(config.timestamp_report_file);

        let mut env_map = setup_required_env();
        env_map.insert("CHECK_HISTORICAL_BALANCES".to_string(), "maybe".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "CHECK_HISTORICAL_BALANCES"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_price_endpoints() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "PRICE_ENDPOINTS".to_string(),
            r#"{"WETH": {"url": "https://prices.example/eth", "json_path": "ethereum.usd"}}"#
                .to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        let weth = &config.price_endpoints["WETH"];
        assert_eq!(weth.json_path, "ethereum.usd");

        let mut env_map = setup_required_env();
        env_map.insert("PRICE_ENDPOINTS".to_string(), "[1,2]".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PRICE_ENDPOINTS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}

//! Claim relay configuration

use crate::error::{ClaimError, ClaimResult};
use crate::request::parse_address;
use anyhow::{Context, Result};
use ethabi::Address;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
pub const DEFAULT_DROP_ADDRESS: &str = "0x0eD5fFcC3D6b9EB9c894AA27EC1c78fd1719CB9B";
/// Base mainnet
pub const DEFAULT_CHAIN_ID: u64 = 8453;
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;
pub const CLAIM_GAS_LIMIT: u64 = 350_000;

/// Relay configuration, read from the environment once at startup.
///
/// Chain values are kept as the raw strings the operator supplied and are
/// resolved per request by [`ClaimConfig::resolve_chain`], so a malformed
/// value fails the request instead of the process.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    /// Server address
    pub server_addr: String,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Shared secret expected as `Authorization: Bearer <secret>`
    pub signer_secret: Option<String>,

    /// RPC endpoint for the chain
    pub rpc_url: String,

    /// Hex-encoded signer key
    #[serde(skip_serializing)]
    pub private_key: Option<String>,

    /// Drop contract address
    pub drop_address: String,

    pub chain_id: String,

    pub token_decimals: String,

    /// Native value attached per claimed unit (in wei)
    pub claim_value_wei_per_unit: String,

    /// Receipt polling interval in milliseconds
    pub receipt_poll_interval_ms: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            cors_enabled: true,
            signer_secret: None,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            private_key: None,
            drop_address: DEFAULT_DROP_ADDRESS.to_string(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            token_decimals: DEFAULT_TOKEN_DECIMALS.to_string(),
            claim_value_wei_per_unit: "0".to_string(),
            receipt_poll_interval_ms: 1000,
        }
    }
}

impl ClaimConfig {
    /// Load from environment variables with defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load from a config file (TOML, YAML, JSON, ... by extension).
    /// Keys missing from the file keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_str().context("Invalid config path")?;

        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path_str))
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize::<Self>()
            .context("Failed to deserialize configuration")
    }

    /// Apply environment variables on top of the current values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup on top of the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Apply values from a key lookup. Empty values count as unset.
    pub fn with_overrides<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = self;

        if let Some(addr) = get("CLAIM_SERVER_ADDR") {
            config.server_addr = addr;
        }

        if let Some(enabled) = get("CLAIM_CORS_ENABLED") {
            config.cors_enabled = enabled.to_lowercase() == "true";
        }

        if let Some(secret) = get("SIGNER_SECRET") {
            config.signer_secret = Some(secret);
        }

        if let Some(rpc_url) = get("RPC_URL") {
            config.rpc_url = rpc_url;
        }

        if let Some(key) = get("PRIVATE_KEY") {
            config.private_key = Some(key);
        }

        if let Some(drop) = get("DROP_ADDRESS") {
            config.drop_address = drop;
        }

        if let Some(chain_id) = get("CHAIN_ID") {
            config.chain_id = chain_id;
        }

        if let Some(decimals) = get("TOKEN_DECIMALS") {
            config.token_decimals = decimals;
        }

        if let Some(value) = get("CLAIM_VALUE_WEI_PER_UNIT") {
            config.claim_value_wei_per_unit = value;
        }

        if let Some(interval) = get("RECEIPT_POLL_INTERVAL_MS") {
            match interval.trim().parse() {
                Ok(ms) => config.receipt_poll_interval_ms = ms,
                Err(_) => warn!(
                    "Ignoring malformed RECEIPT_POLL_INTERVAL_MS {:?}, keeping {} ms",
                    interval, config.receipt_poll_interval_ms
                ),
            }
        }

        config
    }

    /// Whether claims must carry the shared secret
    pub fn auth_required(&self) -> bool {
        self.signer_secret
            .as_deref()
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }

    /// Resolve and validate the chain settings needed to submit a claim
    pub fn resolve_chain(&self) -> ClaimResult<ChainSettings> {
        let private_key = self
            .private_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClaimError::Config("PRIVATE_KEY env missing".to_string()))?;

        let drop_address = parse_address(&self.drop_address)
            .ok_or_else(|| ClaimError::Config(format!("DROP_ADDRESS is not a valid address: {}", self.drop_address)))?;

        let chain_id = self
            .chain_id
            .trim()
            .parse::<u64>()
            .map_err(|_| ClaimError::Config(format!("CHAIN_ID is not a valid chain id: {}", self.chain_id)))?;

        let token_decimals = self
            .token_decimals
            .trim()
            .parse::<u8>()
            .map_err(|_| ClaimError::Config(format!("TOKEN_DECIMALS is not a valid precision: {}", self.token_decimals)))?;

        let value_per_unit = BigUint::parse_bytes(self.claim_value_wei_per_unit.trim().as_bytes(), 10).ok_or_else(|| {
            ClaimError::Config(format!(
                "CLAIM_VALUE_WEI_PER_UNIT is not a non-negative integer: {}",
                self.claim_value_wei_per_unit
            ))
        })?;

        Ok(ChainSettings {
            rpc_url: self.rpc_url.clone(),
            chain_id,
            private_key,
            drop_address,
            token_decimals: token_decimals as u32,
            value_per_unit,
            gas_limit: CLAIM_GAS_LIMIT,
            receipt_poll_interval: self.receipt_poll_interval(),
        })
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms.max(1))
    }
}

/// Validated settings for a single claim submission
#[derive(Clone)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub chain_id: u64,
    pub private_key: String,
    pub drop_address: Address,
    pub token_decimals: u32,
    pub value_per_unit: BigUint,
    pub gas_limit: u64,
    pub receipt_poll_interval: Duration,
}

impl std::fmt::Debug for ChainSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSettings")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &"<redacted>")
            .field("drop_address", &self.drop_address)
            .field("token_decimals", &self.token_decimals)
            .field("value_per_unit", &self.value_per_unit)
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> ClaimConfig {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ClaimConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.drop_address, DEFAULT_DROP_ADDRESS);
        assert_eq!(config.token_decimals, "18");
        assert_eq!(config.claim_value_wei_per_unit, "0");
        assert!(config.private_key.is_none());
        assert!(!config.auth_required());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config_with(&[("RPC_URL", ""), ("SIGNER_SECRET", ""), ("TOKEN_DECIMALS", " ")]);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert!(config.signer_secret.is_none());
        assert_eq!(config.token_decimals, "18");
    }

    #[test]
    fn test_missing_private_key() {
        let err = config_with(&[]).resolve_chain().unwrap_err();
        assert_eq!(err.to_string(), "PRIVATE_KEY env missing");
    }

    #[test]
    fn test_resolve_chain() {
        let config = config_with(&[
            ("PRIVATE_KEY", "0x01"),
            ("TOKEN_DECIMALS", "6"),
            ("CLAIM_VALUE_WEI_PER_UNIT", "1000"),
            ("CHAIN_ID", "84532"),
        ]);
        let chain = config.resolve_chain().unwrap();
        assert_eq!(chain.chain_id, 84532);
        assert_eq!(chain.token_decimals, 6);
        assert_eq!(chain.value_per_unit, BigUint::from(1000u32));
        assert_eq!(chain.gas_limit, 350_000);
        assert_eq!(chain.drop_address, parse_address(DEFAULT_DROP_ADDRESS).unwrap());
        assert!(!format!("{:?}", chain).contains("0x01"));
    }

    #[test]
    fn test_malformed_values_are_config_errors() {
        for (key, value) in [
            ("TOKEN_DECIMALS", "abc"),
            ("TOKEN_DECIMALS", "-1"),
            ("CLAIM_VALUE_WEI_PER_UNIT", "1.5"),
            ("DROP_ADDRESS", "0x123"),
            ("CHAIN_ID", "base"),
        ] {
            let config = config_with(&[("PRIVATE_KEY", "0x01"), (key, value)]);
            let err = config.resolve_chain().unwrap_err();
            assert!(matches!(err, ClaimError::Config(_)), "{}={} gave {:?}", key, value, err);
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn test_receipt_poll_interval() {
        let config = config_with(&[("PRIVATE_KEY", "0x01"), ("RECEIPT_POLL_INTERVAL_MS", " 250 ")]);
        assert_eq!(config.resolve_chain().unwrap().receipt_poll_interval, Duration::from_millis(250));

        let config = config_with(&[("PRIVATE_KEY", "0x01"), ("RECEIPT_POLL_INTERVAL_MS", "soon")]);
        assert_eq!(config.receipt_poll_interval_ms, 1000);
        assert_eq!(config.resolve_chain().unwrap().receipt_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_from_file_with_env_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("claim.toml");
        std::fs::write(
            &path,
            "server_addr = \"127.0.0.1:8080\"\nrpc_url = \"http://node:8545\"\ntoken_decimals = \"6\"\n",
        )
        .unwrap();

        let config = ClaimConfig::from_file(&path).unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:8080");
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.token_decimals, "6");
        assert_eq!(config.drop_address, DEFAULT_DROP_ADDRESS);

        let config = config.with_overrides(|key| (key == "RPC_URL").then(|| "http://other:8545".to_string()));
        assert_eq!(config.rpc_url, "http://other:8545");
        assert_eq!(config.token_decimals, "6");
    }

    #[test]
    fn test_private_key_not_serialized() {
        let config = config_with(&[("PRIVATE_KEY", "0xdeadbeef")]);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("deadbeef"));
    }
}

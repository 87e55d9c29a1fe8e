//! Runtime configuration loaded from environment variables.
//!
//! Every value is read through a lookup function so the parsing rules can be
//! exercised without touching the process environment.

use alloy::primitives::Address;
use eyre::{eyre, Result};
use std::str::FromStr;
use std::time::Duration;

/// RPC endpoint used when `RPC_URL` is not set
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
/// Block explorer used for the staking contract link
pub const DEFAULT_EXPLORER_URL: &str = "https://etherscan.io";
/// Seconds between two polls in watch mode
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// A staking pool as configured by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Display name, e.g. `usdc`
    pub name: String,
    /// Staked token address, also used as the pool key on the staking contract
    pub token: Address,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,
    /// Address of the staking contract
    pub staking_contract: Address,
    /// Pools to display, in configuration order
    pub pools: Vec<PoolConfig>,
    /// Hex private key used to sign transactions
    pub private_key: Option<String>,
    /// Read-only account used when no private key is configured
    pub account: Option<Address>,
    /// Address whose balances are shown instead of the connected account
    pub impersonate: Option<Address>,
    /// Watch mode poll interval
    pub poll_interval: Duration,
    /// Block explorer base url
    pub explorer_url: String,
}

impl Config {
    /// Loads the configuration from the process environment, reading `.env` first.
    ///
    /// # Errors
    /// * If a required variable is missing
    /// * If an address or number cannot be parsed
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// * If `STAKING_CONTRACT_ADDRESS` or `POOLS` is missing
    /// * If a pool listed in `POOLS` has no `POOL_<NAME>` entry
    /// * If an address or number cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| sanitize(&v)).filter(|v| !v.is_empty());

        let rpc_url = get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        url::Url::parse(&rpc_url).map_err(|e| eyre!("RPC_URL is not a valid url: {e}"))?;

        let staking_contract = parse_address(
            "STAKING_CONTRACT_ADDRESS",
            &get("STAKING_CONTRACT_ADDRESS")
                .ok_or_else(|| eyre!("STAKING_CONTRACT_ADDRESS must be set"))?,
        )?;

        let pool_names = get("POOLS").ok_or_else(|| eyre!("POOLS must be set"))?;
        let mut pools = Vec::new();
        for name in pool_names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let key = format!("POOL_{}", name.to_uppercase());
            let token = get(key.as_str()).ok_or_else(|| eyre!("{key} must be set for pool {name}"))?;
            pools.push(PoolConfig {
                name: name.to_string(),
                token: parse_address(&key, &token)?,
            });
        }
        if pools.is_empty() {
            return Err(eyre!("POOLS must list at least one pool"));
        }

        let account = get("ACCOUNT")
            .map(|v| parse_address("ACCOUNT", &v))
            .transpose()?;
        let impersonate = get("IMPERSONATE")
            .map(|v| parse_address("IMPERSONATE", &v))
            .transpose()?;

        let poll_interval_secs = match get("POLL_INTERVAL_SECS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|e| eyre!("POLL_INTERVAL_SECS is not a number: {e}"))?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(Self {
            rpc_url,
            staking_contract,
            pools,
            private_key: get("PRIVATE_KEY"),
            account,
            impersonate,
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
            explorer_url: get("EXPLORER_URL")
                .unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Looks up a configured pool by name
    pub fn pool(&self, name: &str) -> Option<&PoolConfig> {
        self.pools.iter().find(|p| p.name == name)
    }

    /// Explorer link to the staking contract source
    pub fn contract_url(&self) -> String {
        format!("{}/address/{}#code", self.explorer_url, self.staking_contract)
    }
}

/// Strips whitespace and a single layer of surrounding quotes
fn sanitize(value: &str) -> String {
    let trimmed = value.trim();
    let unquoted = if (trimmed.starts_with('"') && trimmed.ends_with('"'))
        || (trimmed.starts_with('\'') && trimmed.ends_with('\''))
    {
        &trimmed[1..trimmed.len().saturating_sub(1).max(1)]
    } else {
        trimmed
    };
    unquoted.trim().to_string()
}

fn parse_address(key: &str, value: &str) -> Result<Address> {
    Address::from_str(value).map_err(|e| eyre!("{key} is not a valid address: {e}"))
}

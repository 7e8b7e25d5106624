//! SDK configuration.
use crate::{
    constants::{DEFAULT_GAS_BUDGET, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SLIPPAGE_BPS, MAX_BPS},
    types::ObjectId,
};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// SDK configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    /// Ledger RPC configuration.
    pub rpc: RpcConfig,
    /// Package holding the futarchy modules.
    pub package_id: ObjectId,
    /// Gas configuration.
    #[serde(default)]
    pub gas: GasConfig,
    /// Default slippage tolerance applied to swap quotes, in basis points.
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,
}

const fn default_slippage_bps() -> u16 {
    DEFAULT_SLIPPAGE_BPS
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            package_id: ObjectId::ZERO,
            gas: GasConfig::default(),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl SdkConfig {
    /// Sets the ledger RPC endpoint.
    pub fn with_rpc_url(mut self, url: Url) -> Self {
        self.rpc.url = url;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.rpc.request_timeout = timeout;
        self
    }

    /// Sets the futarchy package id.
    pub fn with_package_id(mut self, package_id: ObjectId) -> Self {
        self.package_id = package_id;
        self
    }

    /// Sets the gas budget.
    pub fn with_gas_budget(mut self, budget: u64) -> Self {
        self.gas.budget = budget;
        self
    }

    /// Sets the gas price. `None` uses the reference gas price.
    pub fn with_gas_price(mut self, price: Option<u64>) -> Self {
        self.gas.price = price;
        self
    }

    /// Sets the default slippage tolerance, clamped to 100%.
    pub fn with_slippage_bps(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = slippage_bps.min(MAX_BPS as u16);
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        if config.slippage_bps as u64 > MAX_BPS {
            eyre::bail!("slippageBps must be at most {MAX_BPS}, got {}", config.slippage_bps);
        }
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Ledger RPC configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcConfig {
    /// The JSON-RPC endpoint.
    pub url: Url,
    /// Timeout for a single request, in seconds.
    #[serde(with = "crate::serde::duration")]
    pub request_timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("http://127.0.0.1:9000").expect("valid url"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Gas configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasConfig {
    /// Gas budget for each transaction.
    pub budget: u64,
    /// Fixed gas price. Uses the reference gas price when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self { budget: DEFAULT_GAS_BUDGET, price: None }
    }
}

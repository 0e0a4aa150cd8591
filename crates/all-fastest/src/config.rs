//! Simulator configuration types and loading logic.

use fanout_tracing::TracingConfig;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::route::Operation;

/// Top-level simulator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub tracing: TracingConfig,

    #[serde(default)]
    pub drain: DrainConfig,

    #[serde(default)]
    pub run: RunConfig,

    /// Route node for the top-level all-fastest route: a list of children,
    /// or a table with a `children` array.
    pub route: serde_json::Value,
}

/// Background drain limits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrainConfig {
    /// Cap on abandoned calls left running. Unbounded when absent.
    #[serde(default)]
    pub max_pending: Option<usize>,
}

/// Request replay parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_requests")]
    pub requests: usize,

    #[serde(default = "default_operation")]
    pub operation: Operation,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// How long to let background drains finish before reporting.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_requests() -> usize {
    10
}

fn default_operation() -> Operation {
    Operation::Get
}

fn default_key_prefix() -> String {
    "key".to_string()
}

fn default_settle_ms() -> u64 {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            operation: default_operation(),
            key_prefix: default_key_prefix(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl SimConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (ALL_FASTEST_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let config: SimConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ALL_FASTEST_").split("__"))
            .extract()?;

        Ok(config)
    }
}

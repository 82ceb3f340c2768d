//! Environment-based configuration.

use std::net::SocketAddr;

use anyhow::{Context, bail};

use stockroom_infra::EngineConfig;
use stockroom_transactions::{DeletePolicy, StockPolicy};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres when set, otherwise the in-memory store.
    pub database_url: Option<String>,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values take the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = EngineConfig::default();

        let bind_addr = get("STOCKROOM_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("STOCKROOM_BIND_ADDR must be a socket address")?;

        let outgoing_requires_stock = match get("STOCKROOM_OUTGOING_STOCK_CHECK") {
            Some(v) => parse_bool("STOCKROOM_OUTGOING_STOCK_CHECK", &v)?,
            None => defaults.stock.outgoing_requires_stock,
        };

        let delete = match get("STOCKROOM_DRAFT_ONLY_DELETE") {
            Some(v) if parse_bool("STOCKROOM_DRAFT_ONLY_DELETE", &v)? => DeletePolicy::DraftOnly,
            Some(_) => DeletePolicy::AnyStatus,
            None => defaults.delete,
        };

        let number_attempts = match get("STOCKROOM_NUMBER_ATTEMPTS") {
            Some(v) => {
                let n: u32 = v
                    .trim()
                    .parse()
                    .context("STOCKROOM_NUMBER_ATTEMPTS must be a positive integer")?;
                if n == 0 {
                    bail!("STOCKROOM_NUMBER_ATTEMPTS must be a positive integer");
                }
                n
            }
            None => defaults.number_attempts,
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            engine: EngineConfig {
                stock: StockPolicy {
                    outgoing_requires_stock,
                },
                delete,
                number_attempts,
            },
        })
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got '{other}'"),
    }
}

use anyhow::{Context, Result};
use std::time::Duration;

use crate::engine::{CountPolicy, DEFAULT_PAGE_SIZE};

/// Runtime configuration read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// REST backend root; `None` serves the in-memory sample listings
    pub api_url: Option<String>,
    pub page_size: usize,
    pub http_timeout: Duration,
    pub count_policy: CountPolicy,
    /// Acting user for the command-line demo
    pub user_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            http_timeout: Duration::from_secs(30),
            count_policy: CountPolicy::default(),
            user_id: None,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let page_size = match get("LISTINGS_PAGE_SIZE") {
            Some(raw) => {
                let size: usize = raw
                    .parse()
                    .with_context(|| format!("LISTINGS_PAGE_SIZE is not a number: {}", raw))?;
                anyhow::ensure!(size > 0, "LISTINGS_PAGE_SIZE must be positive");
                size
            }
            None => defaults.page_size,
        };

        let http_timeout = match get("LISTINGS_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().with_context(|| {
                format!("LISTINGS_HTTP_TIMEOUT_SECS is not a number: {}", raw)
            })?),
            None => defaults.http_timeout,
        };

        let count_policy = match get("LISTINGS_COUNT_POLICY") {
            Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
            None => defaults.count_policy,
        };

        Ok(Self {
            api_url: get("LISTINGS_API_URL"),
            page_size,
            http_timeout,
            count_policy,
            user_id: get("LISTINGS_USER_ID"),
        })
    }
}

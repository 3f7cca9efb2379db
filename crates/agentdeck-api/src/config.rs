// Server configuration loaded from environment variables
// Decision: Every setting has a default except DATABASE_URL

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    /// Prefix for every API route, e.g. `/api`. Empty by default.
    pub api_prefix: String,
    /// Upsert the built-in tools at start-up
    pub seed_builtin_tools: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let api_prefix = normalize_prefix(&std::env::var("API_PREFIX").unwrap_or_default());

        let seed_builtin_tools = std::env::var("SEED_BUILTIN_TOOLS")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            api_prefix,
            seed_builtin_tools,
        })
    }
}

/// `api/` and `/api/` both become `/api`; blank stays empty
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

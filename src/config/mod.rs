use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub feed_max_limit: i64,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let http_addr = SocketAddr::from_str(&env.or("HTTP_ADDR", "0.0.0.0:8080"))
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        let feed_max_limit: i64 = env.parse_or("FEED_MAX_LIMIT", "100")?;
        if feed_max_limit < 1 {
            return Err(anyhow!("invalid FEED_MAX_LIMIT: must be at least 1"));
        }

        Ok(Self {
            http_addr,
            database_url: env.required("DATABASE_URL")?,
            db_max_connections: env.parse_or("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env.parse_or("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env.parse_or("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env.parse_or("DB_MAX_LIFETIME_SECONDS", "1800")?,
            feed_max_limit,
            max_body_bytes: env.parse_or("MAX_BODY_BYTES", "65536")?,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn or(&self, key: &str, default: &str) -> String {
        (self.lookup)(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String> {
        (self.lookup)(key).ok_or_else(|| anyhow!("missing required env var: {}", key))
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        self.or(key, default)
            .parse::<T>()
            .map_err(|err| anyhow!("invalid {}: {}", key, err))
    }
}

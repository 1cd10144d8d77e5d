use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_UPSTREAM_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";

#[derive(Debug, Clone)]
pub struct Deadlines {
    /// Budget for the whole inbound request.
    pub request: Duration,
    pub upstream: Duration,
    pub persist: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            request: Duration::from_millis(500),
            upstream: Duration::from_millis(200),
            persist: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_url: String,
    pub upstream_url: String,
    pub deadlines: Deadlines,
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Deadlines::default();

        Ok(Self {
            host: var_or("HOST", "localhost".to_string())?,
            port: var_or("PORT", 8080)?,
            db_url: var_or("DB_URL", "cotacao.db".to_string())?,
            upstream_url: var_or("UPSTREAM_URL", DEFAULT_UPSTREAM_URL.to_string())?,
            deadlines: Deadlines {
                request: millis_or("REQUEST_TIMEOUT_MS", defaults.request)?,
                upstream: millis_or("UPSTREAM_TIMEOUT_MS", defaults.upstream)?,
                persist: millis_or("PERSIST_TIMEOUT_MS", defaults.persist)?,
            },
            shutdown_timeout: Duration::from_secs(var_or("SHUTDOWN_TIMEOUT_SECS", 10)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout: Duration,
    pub output_file: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_url: var_or("SERVER_URL", "http://localhost:8080/cotacao".to_string())?,
            timeout: millis_or("CLIENT_TIMEOUT_MS", Duration::from_millis(300))?,
            output_file: var_or("OUTPUT_FILE", "cotacao.txt".to_string())?,
        })
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e).with_context(|| format!("Can't read {}", key)),
    }
}

fn millis_or(key: &str, default: Duration) -> Result<Duration> {
    let millis = var_or(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

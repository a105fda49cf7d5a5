use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub scrape_interval: Duration,
    pub fetch_timeout: Duration,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_SCRAPE_INTERVAL_SECS: u64 = 3600;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let scrape_interval_secs: u64 =
            get_env_parse_or("SCRAPE_INTERVAL_SECS", DEFAULT_SCRAPE_INTERVAL_SECS)?;
        let fetch_timeout_secs: u64 =
            get_env_parse_or("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;

        if scrape_interval_secs == 0 {
            return Err(Error::Config(
                "SCRAPE_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if fetch_timeout_secs == 0 {
            return Err(Error::Config(
                "FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            server_address: env::var("SERVER_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string()),
            database_url: get_env("DATABASE_URL")?,
            db_max_connections: get_env_parse_or(
                "DB_MAX_CONNECTIONS",
                DEFAULT_DB_MAX_CONNECTIONS,
            )?,
            scrape_interval: Duration::from_secs(scrape_interval_secs),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_to_default_when_unset() {
        env::remove_var("CAREERS_TEST_UNSET_KNOB");
        let value: u64 = get_env_parse_or("CAREERS_TEST_UNSET_KNOB", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_or_rejects_garbage() {
        env::set_var("CAREERS_TEST_BAD_KNOB", "soon");
        let err = get_env_parse_or::<u64>("CAREERS_TEST_BAD_KNOB", 1).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("CAREERS_TEST_BAD_KNOB")));
    }
}

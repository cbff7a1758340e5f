use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, anyhow, bail};
use chrono::FixedOffset;
use dotenvy::dotenv;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mysql,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub api_prefix: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_signup_per_min: u32,

    pub json_limit_bytes: usize,
    /// Offset used to decide which calendar day an attendance event falls on
    pub attendance_offset: FixedOffset,
    pub ai: AiConfig,
    pub seed_data: bool,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store_backend: StoreBackend = parse(&get("STORE_BACKEND", "memory"), "STORE_BACKEND")?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if store_backend == StoreBackend::Mysql && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND=mysql");
        }

        Ok(Self {
            server_addr: get("SERVER_ADDR", "0.0.0.0:3001"),
            store_backend,
            database_url,
            api_prefix: get("API_PREFIX", "/api"),

            rate_login_per_min: parse(&get("RATE_LOGIN_PER_MIN", "60"), "RATE_LOGIN_PER_MIN")?,
            rate_signup_per_min: parse(&get("RATE_SIGNUP_PER_MIN", "30"), "RATE_SIGNUP_PER_MIN")?,

            json_limit_bytes: parse(&get("JSON_LIMIT_BYTES", "5242880"), "JSON_LIMIT_BYTES")?,
            attendance_offset: parse(
                &get("ATTENDANCE_UTC_OFFSET", "+00:00"),
                "ATTENDANCE_UTC_OFFSET",
            )?,
            ai: AiConfig {
                api_key: lookup("API_KEY").filter(|key| !key.is_empty()),
                model: get("AI_MODEL", "gemini-2.5-flash"),
                base_url: get(
                    "AI_BASE_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                timeout: Duration::from_secs(parse(&get("AI_TIMEOUT_SECS", "30"), "AI_TIMEOUT_SECS")?),
            },
            seed_data: parse(&get("SEED_DATA", "true"), "SEED_DATA")?,

            log_dir: get("LOG_DIR", "logs"),
            log_level: parse(&get("LOG_LEVEL", "debug"), "LOG_LEVEL")?,
        })
    }
}

fn parse<T: FromStr>(value: &str, key: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_run_in_memory_without_ai() {
        let config = config(&[]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:3001");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_login_per_min, 60);
        assert_eq!(config.json_limit_bytes, 5 * 1024 * 1024);
        assert_eq!(config.attendance_offset.local_minus_utc(), 0);
        assert!(config.ai.api_key.is_none());
        assert_eq!(config.ai.model, "gemini-2.5-flash");
        assert!(config.seed_data);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn mysql_backend_needs_a_database_url() {
        let err = config(&[("STORE_BACKEND", "mysql")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let config = config(&[
            ("STORE_BACKEND", "mysql"),
            ("DATABASE_URL", "mysql://root@localhost/hr"),
        ])
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Mysql);
    }

    #[test]
    fn offset_and_numbers_are_validated() {
        let config = config(&[("ATTENDANCE_UTC_OFFSET", "+06:00")]).unwrap();
        assert_eq!(config.attendance_offset.local_minus_utc(), 6 * 3600);

        let err = config_err(&[("RATE_LOGIN_PER_MIN", "lots")]);
        assert!(err.contains("RATE_LOGIN_PER_MIN"));
        let err = config_err(&[("STORE_BACKEND", "postgres")]);
        assert!(err.contains("STORE_BACKEND"));
    }

    fn config_err(vars: &[(&str, &str)]) -> String {
        config(vars).unwrap_err().to_string()
    }
}

pub mod cluster;
pub mod database;
pub mod monitoring;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub cluster: cluster::ClusterConfig,
    pub monitoring: monitoring::MonitoringConfig,

    // Build info
    pub commit_hash: String,
    pub build_time: String,
    pub version: String,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            cluster: cluster::ClusterConfig::from_env(),
            monitoring: monitoring::MonitoringConfig::from_env(),

            // Build info
            commit_hash: env::var("COMMIT_HASH").unwrap_or_else(|_| "unknown".to_string()),
            build_time: env::var("BUILD_TIME").unwrap_or_else(|_| "unknown".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            // Logging
            log_level: env::var("UNIVERSE_IMPORT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: LogFormat::parse(
                &env::var("UNIVERSE_IMPORT_LOG_FORMAT").unwrap_or_default(),
            ),
        }
    }
}

/// Read a millisecond duration from the environment, falling back to `default_ms`
pub(crate) fn env_millis(key: &str, default_ms: u64) -> std::time::Duration {
    let ms = env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    std::time::Duration::from_millis(ms)
}

/// Read a port from the environment, falling back to `default`
pub(crate) fn env_port(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(default)
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

use std::env;
use std::path::PathBuf;

use super::env_port;

/// Configuration for the Prometheus scrape targets written on import
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Directory watched by Prometheus `file_sd` (env: `UNIVERSE_IMPORT_PROMETHEUS_TARGETS_DIR`)
    pub targets_dir: PathBuf,
    pub node_exporter_port: u16,
    pub master_http_port: u16,
    pub tserver_http_port: u16,
    pub ycql_http_port: u16,
    pub ysql_http_port: u16,
    pub yedis_http_port: u16,
}

impl MonitoringConfig {
    pub fn from_env() -> Self {
        Self {
            targets_dir: PathBuf::from(
                env::var("UNIVERSE_IMPORT_PROMETHEUS_TARGETS_DIR")
                    .unwrap_or_else(|_| "/opt/yugabyte/prometheus/targets".to_string()),
            ),
            node_exporter_port: env_port("UNIVERSE_IMPORT_NODE_EXPORTER_PORT", 9300),
            master_http_port: env_port("UNIVERSE_IMPORT_MASTER_HTTP_PORT", 7000),
            tserver_http_port: env_port("UNIVERSE_IMPORT_TSERVER_HTTP_PORT", 9000),
            ycql_http_port: env_port("UNIVERSE_IMPORT_YCQL_HTTP_PORT", 12000),
            ysql_http_port: env_port("UNIVERSE_IMPORT_YSQL_HTTP_PORT", 13000),
            yedis_http_port: env_port("UNIVERSE_IMPORT_YEDIS_HTTP_PORT", 11000),
        }
    }
}

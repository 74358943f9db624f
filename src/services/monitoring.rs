//! Prometheus scrape targets for imported universes.
//!
//! Targets are written as `file_sd` documents, one file per universe, so a
//! Prometheus instance watching the directory picks them up without reload.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::monitoring::MonitoringConfig;
use crate::error::{AppError, Result};
use crate::services::cluster::HostPort;
use crate::services::universe_store::UniverseRecord;

/// Writes the monitoring configuration for a universe
#[async_trait]
pub trait ScrapeConfigWriter: Send + Sync {
    async fn write_scrape_config(&self, universe: &UniverseRecord) -> Result<()>;
}

/// One `file_sd` target group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetGroup {
    pub targets: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// Build the target groups for a universe, one per export type
pub fn build_target_groups(universe: &UniverseRecord, config: &MonitoringConfig) -> Vec<TargetGroup> {
    let node_prefix = format!("yb-{}", universe.name);

    let master_hosts: Vec<String> = universe
        .master_addresses
        .iter()
        .map(|m| m.url_host())
        .collect();
    let tserver_hosts: Vec<String> = universe
        .nodes
        .iter()
        .map(|n| HostPort::new(&n.private_ip, n.rpc_port).url_host())
        .collect();

    let mut all_hosts: Vec<String> = master_hosts.iter().chain(&tserver_hosts).cloned().collect();
    all_hosts.sort();
    all_hosts.dedup();

    let group = |export_type: &str, hosts: &[String], port: u16| TargetGroup {
        targets: hosts.iter().map(|h| format!("{}:{}", h, port)).collect(),
        labels: BTreeMap::from([
            ("export_type".to_string(), export_type.to_string()),
            ("node_prefix".to_string(), node_prefix.clone()),
            ("universe_uuid".to_string(), universe.id.to_string()),
        ]),
    };

    vec![
        group("node_export", &all_hosts, config.node_exporter_port),
        group("master_export", &master_hosts, config.master_http_port),
        group("tserver_export", &tserver_hosts, config.tserver_http_port),
        group("cql_export", &tserver_hosts, config.ycql_http_port),
        group("ysql_export", &tserver_hosts, config.ysql_http_port),
        group("redis_export", &tserver_hosts, config.yedis_http_port),
    ]
}

/// Writes target files into a directory watched by Prometheus
pub struct FileScrapeConfigWriter {
    config: MonitoringConfig,
}

impl FileScrapeConfigWriter {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    /// Path of the target file for a universe
    pub fn target_file(&self, universe: &UniverseRecord) -> PathBuf {
        self.config
            .targets_dir
            .join(format!("universe_{}.yaml", universe.id))
    }
}

#[async_trait]
impl ScrapeConfigWriter for FileScrapeConfigWriter {
    async fn write_scrape_config(&self, universe: &UniverseRecord) -> Result<()> {
        if universe.nodes.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Universe {} has no nodes to monitor",
                universe.id
            )));
        }

        let groups = build_target_groups(universe, &self.config);
        let yaml = serde_yaml::to_string(&groups)?;

        tokio::fs::create_dir_all(&self.config.targets_dir).await?;
        let path = self.target_file(universe);
        let tmp = path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, yaml).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::info!(
            "Wrote {} scrape target groups for universe {} to {}",
            groups.len(),
            universe.id,
            path.display()
        );
        Ok(())
    }
}

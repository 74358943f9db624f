use std::time::Duration;

use super::{env_millis, env_port};

/// Timeouts and ports used when talking to a live cluster
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Web UI port of the master processes (env: `UNIVERSE_IMPORT_MASTER_WEB_PORT`)
    pub master_web_port: u16,
    /// RPC port recorded for discovered tablet servers (env: `UNIVERSE_IMPORT_TSERVER_RPC_PORT`)
    pub tserver_rpc_port: u16,
    /// Upper bound for a single master to answer (env: `UNIVERSE_IMPORT_MASTER_REACHABLE_TIMEOUT_MS`)
    pub master_reachable_timeout: Duration,
    /// Upper bound for the cluster to report a master leader (env: `UNIVERSE_IMPORT_LEADER_ELECTION_TIMEOUT_MS`)
    pub leader_election_timeout: Duration,
    /// Upper bound for any single directory query (env: `UNIVERSE_IMPORT_RPC_TIMEOUT_MS`)
    pub rpc_timeout: Duration,
    /// Oldest acceptable tserver heartbeat (env: `UNIVERSE_IMPORT_HEARTBEAT_MAX_AGE_MS`)
    pub heartbeat_max_age: Duration,
    /// Delay between polls while waiting on the cluster (env: `UNIVERSE_IMPORT_POLL_INTERVAL_MS`)
    pub poll_interval: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            master_web_port: 7000,
            tserver_rpc_port: 9100,
            master_reachable_timeout: Duration::from_secs(15),
            leader_election_timeout: Duration::from_secs(30),
            rpc_timeout: Duration::from_secs(10),
            heartbeat_max_age: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ClusterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            master_web_port: env_port("UNIVERSE_IMPORT_MASTER_WEB_PORT", defaults.master_web_port),
            tserver_rpc_port: env_port(
                "UNIVERSE_IMPORT_TSERVER_RPC_PORT",
                defaults.tserver_rpc_port,
            ),
            master_reachable_timeout: env_millis(
                "UNIVERSE_IMPORT_MASTER_REACHABLE_TIMEOUT_MS",
                defaults.master_reachable_timeout.as_millis() as u64,
            ),
            leader_election_timeout: env_millis(
                "UNIVERSE_IMPORT_LEADER_ELECTION_TIMEOUT_MS",
                defaults.leader_election_timeout.as_millis() as u64,
            ),
            rpc_timeout: env_millis(
                "UNIVERSE_IMPORT_RPC_TIMEOUT_MS",
                defaults.rpc_timeout.as_millis() as u64,
            ),
            heartbeat_max_age: env_millis(
                "UNIVERSE_IMPORT_HEARTBEAT_MAX_AGE_MS",
                defaults.heartbeat_max_age.as_millis() as u64,
            ),
            poll_interval: env_millis(
                "UNIVERSE_IMPORT_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            ),
        }
    }
}

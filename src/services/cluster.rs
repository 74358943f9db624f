//! Capability surface of a live cluster.
//!
//! The import phases only need a handful of questions answered by the
//! cluster: can each master be reached, is there a master leader, and which
//! tablet servers are registered. [`ClusterClient`] captures exactly that so
//! the HTTP implementation and the deterministic test fakes are
//! interchangeable.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `host:port` pair as given in the seed master list
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Same host with a different port
    pub fn with_port(&self, port: u16) -> Self {
        Self::new(self.host.clone(), port)
    }

    /// Host formatted for use inside a URL authority
    pub fn url_host(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.url_host(), self.port)
    }
}

/// A token that is not a valid `host:port` pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse host:port from masterAddresses: {token}")]
pub struct HostPortParseError {
    pub token: String,
}

impl FromStr for HostPort {
    type Err = HostPortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let err = || HostPortParseError {
            token: token.to_string(),
        };

        let (host, port) = token.rsplit_once(':').ok_or_else(err)?;
        let host = match host.strip_prefix('[') {
            Some(rest) => rest.strip_suffix(']').ok_or_else(err)?,
            // Unbracketed IPv6 is ambiguous
            None if host.contains(':') => return Err(err()),
            None => host,
        };
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(err());
        }
        let port: u16 = port.parse().map_err(|_| err())?;
        if port == 0 {
            return Err(err());
        }

        Ok(HostPort::new(host, port))
    }
}

/// Parse a comma separated `host:port` list, failing on the first bad entry
pub fn parse_host_ports(list: &str) -> Result<Vec<HostPort>, HostPortParseError> {
    list.split(',').map(str::parse).collect()
}

/// Render a list back to its comma separated form
pub fn join_host_ports(addrs: &[HostPort]) -> String {
    addrs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Opaque connection to a cluster, addressed by its masters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterHandle {
    masters: Vec<HostPort>,
}

impl ClusterHandle {
    pub fn new(masters: Vec<HostPort>) -> Self {
        Self { masters }
    }

    pub fn masters(&self) -> &[HostPort] {
        &self.masters
    }
}

/// Liveness reported by the master for a tablet server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataNodeStatus {
    Alive,
    Dead,
    Unknown,
}

impl DataNodeStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ALIVE" => DataNodeStatus::Alive,
            "DEAD" => DataNodeStatus::Dead,
            _ => DataNodeStatus::Unknown,
        }
    }
}

/// One tablet server as seen in the master's directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataNode {
    pub uuid: String,
    /// RPC address the tablet server registered with
    pub address: HostPort,
    pub status: DataNodeStatus,
    pub last_heartbeat: DateTime<Utc>,
}

/// Directory of tablet servers, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataNodeListing {
    pub count: usize,
    pub nodes: Vec<DataNode>,
}

impl DataNodeListing {
    pub fn new(nodes: Vec<DataNode>) -> Self {
        Self {
            count: nodes.len(),
            nodes,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("No master addresses given")]
    NoMasters,

    #[error("Master {0} is unreachable: {1}")]
    Unreachable(HostPort, String),

    #[error("Unexpected response from {0}: {1}")]
    Protocol(HostPort, String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// What the import phases need from a running cluster
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Open a handle addressed by the given masters
    async fn connect(&self, masters: &[HostPort]) -> Result<ClusterHandle, ClusterError>;

    /// Wait until `server` answers or `timeout` elapses
    async fn wait_for_reachable(
        &self,
        handle: &ClusterHandle,
        server: &HostPort,
        timeout: Duration,
    ) -> bool;

    /// Wait until the cluster reports a master leader or `timeout` elapses
    async fn wait_for_leader(&self, handle: &ClusterHandle, timeout: Duration) -> bool;

    /// Current tablet server directory
    async fn list_data_nodes(&self, handle: &ClusterHandle)
        -> Result<DataNodeListing, ClusterError>;
}

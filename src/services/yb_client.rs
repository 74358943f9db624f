//! Cluster client backed by the masters' web endpoints.
//!
//! Masters are addressed by their RPC `host:port`; requests go to the same
//! host on the configured web port:
//! - `/api/v1/version` answers on every live master
//! - `/api/v1/masters` lists the masters with their raft role
//! - `/api/v1/tablet-servers` lists the registered tablet servers grouped by placement

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::time::Instant;

use crate::config::cluster::ClusterConfig;
use crate::services::cluster::{
    ClusterClient, ClusterError, ClusterHandle, DataNode, DataNodeListing, DataNodeStatus,
    HostPort,
};

#[derive(Debug, Deserialize)]
struct MastersResponse {
    #[serde(default)]
    masters: Vec<MasterEntry>,
}

#[derive(Debug, Deserialize)]
struct MasterEntry {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TabletServerEntry {
    #[serde(default)]
    permanent_uuid: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    time_since_hb_sec: Option<f64>,
}

/// Placement uuid -> (web `host:port` -> entry)
type TabletServersResponse = HashMap<String, HashMap<String, TabletServerEntry>>;

/// `ClusterClient` speaking to the masters over HTTP
pub struct YbHttpClient {
    http: reqwest::Client,
    config: ClusterConfig,
}

impl YbHttpClient {
    pub fn new(config: ClusterConfig) -> Result<Self, ClusterError> {
        let http = reqwest::Client::builder()
            .timeout(config.rpc_timeout)
            .connect_timeout(config.rpc_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn master_url(&self, master: &HostPort, path: &str) -> String {
        format!(
            "http://{}{}",
            master.with_port(self.config.master_web_port),
            path
        )
    }

    async fn ping(&self, server: &HostPort) -> Result<(), ClusterError> {
        let response = self
            .http
            .get(self.master_url(server, "/api/v1/version"))
            .send()
            .await
            .map_err(|e| ClusterError::Unreachable(server.clone(), e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClusterError::Unreachable(
                server.clone(),
                format!("HTTP {}", response.status()),
            ));
        }
        Ok(())
    }

    async fn has_leader(&self, master: &HostPort) -> Result<bool, ClusterError> {
        let body: MastersResponse = self
            .http
            .get(self.master_url(master, "/api/v1/masters"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body
            .masters
            .iter()
            .any(|m| m.role.as_deref().map(str::to_uppercase).as_deref() == Some("LEADER")))
    }

    async fn fetch_tablet_servers(&self, master: &HostPort) -> Result<DataNodeListing, ClusterError> {
        let body: TabletServersResponse = self
            .http
            .get(self.master_url(master, "/api/v1/tablet-servers"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let now = Utc::now();
        let mut nodes = Vec::new();
        for servers in body.into_values() {
            for (web_addr, entry) in servers {
                let web: HostPort = web_addr.parse().map_err(|_| {
                    ClusterError::Protocol(
                        master.clone(),
                        format!("bad tablet server address {}", web_addr),
                    )
                })?;
                let since_hb = entry.time_since_hb_sec.unwrap_or(f64::MAX).max(0.0);
                let last_heartbeat = chrono::Duration::from_std(Duration::from_secs_f64(
                    since_hb.min(u32::MAX as f64),
                ))
                .map(|age| now - age)
                .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

                nodes.push(DataNode {
                    uuid: entry.permanent_uuid.unwrap_or_default(),
                    address: web.with_port(self.config.tserver_rpc_port),
                    status: entry
                        .status
                        .as_deref()
                        .map(DataNodeStatus::parse)
                        .unwrap_or(DataNodeStatus::Unknown),
                    last_heartbeat,
                });
            }
        }

        // HashMap iteration order is arbitrary; discovery order must not be
        nodes.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(DataNodeListing::new(nodes))
    }
}

#[async_trait]
impl ClusterClient for YbHttpClient {
    async fn connect(&self, masters: &[HostPort]) -> Result<ClusterHandle, ClusterError> {
        if masters.is_empty() {
            return Err(ClusterError::NoMasters);
        }
        Ok(ClusterHandle::new(masters.to_vec()))
    }

    async fn wait_for_reachable(
        &self,
        _handle: &ClusterHandle,
        server: &HostPort,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.ping(server)).await {
                Ok(Ok(())) => return true,
                Ok(Err(e)) => tracing::debug!("Master {} not reachable yet: {}", server, e),
                Err(_) => return false,
            }
            if Instant::now() + self.config.poll_interval >= deadline {
                return false;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn wait_for_leader(&self, handle: &ClusterHandle, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            for master in handle.masters() {
                match tokio::time::timeout_at(deadline, self.has_leader(master)).await {
                    Ok(Ok(true)) => return true,
                    Ok(Ok(false)) => {}
                    Ok(Err(e)) => tracing::debug!("Leader query on {} failed: {}", master, e),
                    Err(_) => return false,
                }
            }
            if Instant::now() + self.config.poll_interval >= deadline {
                return false;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn list_data_nodes(
        &self,
        handle: &ClusterHandle,
    ) -> Result<DataNodeListing, ClusterError> {
        let mut last_err = ClusterError::NoMasters;
        for master in handle.masters() {
            match self.fetch_tablet_servers(master).await {
                Ok(listing) => return Ok(listing),
                Err(e) => {
                    tracing::debug!("Tablet server listing from {} failed: {}", master, e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    /// Serve `router` on an ephemeral local port, returning the port
    async fn serve(router: Router) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        port
    }

    /// Master web API with canned answers; `leader_role` is the role of the second master
    fn master_api(leader_role: &'static str) -> Router {
        Router::new()
            .route(
                "/api/v1/version",
                get(|| async { Json(json!({"version_number": "2.20.1.0"})) }),
            )
            .route(
                "/api/v1/masters",
                get(move || async move {
                    Json(json!({"masters": [{"role": "FOLLOWER"}, {"role": leader_role}]}))
                }),
            )
            .route(
                "/api/v1/tablet-servers",
                get(|| async {
                    Json(json!({
                        "": {
                            "127.0.0.3:9000": {"permanent_uuid": "c", "status": "ALIVE", "time_since_hb_sec": 0.5},
                            "127.0.0.1:9000": {"permanent_uuid": "a", "status": "ALIVE", "time_since_hb_sec": 1.5}
                        },
                        "placement-b": {
                            "127.0.0.2:9000": {"permanent_uuid": "b", "status": "DEAD"}
                        }
                    }))
                }),
            )
    }

    fn client_for(port: u16) -> YbHttpClient {
        YbHttpClient::new(ClusterConfig {
            master_web_port: port,
            tserver_rpc_port: 9100,
            rpc_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(20),
            ..ClusterConfig::default()
        })
        .unwrap()
    }

    fn local_master() -> ClusterHandle {
        ClusterHandle::new(vec![HostPort::new("127.0.0.1", 7100)])
    }

    #[tokio::test]
    async fn tablet_servers_are_listed_in_address_order_on_rpc_port() {
        let client = client_for(serve(master_api("LEADER")).await);

        let listing = client.list_data_nodes(&local_master()).await.unwrap();

        assert_eq!(listing.count, 3);
        let addresses: Vec<String> = listing.nodes.iter().map(|n| n.address.to_string()).collect();
        assert_eq!(
            addresses,
            vec!["127.0.0.1:9100", "127.0.0.2:9100", "127.0.0.3:9100"]
        );
        let uuids: Vec<&str> = listing.nodes.iter().map(|n| n.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a", "b", "c"]);
        assert_eq!(listing.nodes[0].status, DataNodeStatus::Alive);
        assert_eq!(listing.nodes[1].status, DataNodeStatus::Dead);
    }

    #[tokio::test]
    async fn heartbeat_age_comes_from_time_since_hb() {
        let client = client_for(serve(master_api("LEADER")).await);
        let before = Utc::now();

        let listing = client.list_data_nodes(&local_master()).await.unwrap();

        let age = |i: usize| before.signed_duration_since(listing.nodes[i].last_heartbeat);
        // 1.5 s for 127.0.0.1 and 0.5 s for 127.0.0.3, give or take the request time
        assert!(age(0) > chrono::Duration::milliseconds(1000));
        assert!(age(0) < chrono::Duration::seconds(5));
        assert!(age(2) < chrono::Duration::seconds(4));
        // No heartbeat reported at all reads as stale
        assert!(age(1) > chrono::Duration::days(365));

        let stale = crate::services::import::check_heartbeats(
            &listing.nodes,
            Utc::now(),
            Duration::from_secs(60),
        )
        .unwrap_err();
        assert!(stale.contains("127.0.0.2:9100"));
        assert!(!stale.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn listing_falls_through_to_next_master() {
        let client = client_for(serve(master_api("LEADER")).await);
        // Nothing listens on 127.0.0.9, the second master answers
        let handle = ClusterHandle::new(vec![
            HostPort::new("127.0.0.9", 7100),
            HostPort::new("127.0.0.1", 7100),
        ]);

        let listing = client.list_data_nodes(&handle).await.unwrap();
        assert_eq!(listing.nodes.len(), 3);
    }

    #[tokio::test]
    async fn leader_and_reachability_are_seen() {
        let client = client_for(serve(master_api("LEADER")).await);
        let handle = local_master();

        assert!(
            client
                .wait_for_reachable(&handle, &HostPort::new("127.0.0.1", 7100), Duration::from_secs(1))
                .await
        );
        assert!(client.wait_for_leader(&handle, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn no_leader_gives_up_at_timeout() {
        let client = client_for(serve(master_api("FOLLOWER")).await);
        let started = Instant::now();

        let elected = client
            .wait_for_leader(&local_master(), Duration::from_millis(200))
            .await;

        assert!(!elected);
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let client = client_for(port);

        let reachable = client
            .wait_for_reachable(
                &local_master(),
                &HostPort::new("127.0.0.1", 7100),
                Duration::from_millis(150),
            )
            .await;
        assert!(!reachable);
        assert!(client.list_data_nodes(&local_master()).await.is_err());
    }

    #[tokio::test]
    async fn connect_requires_masters() {
        let client = YbHttpClient::new(ClusterConfig::default()).unwrap();
        assert!(matches!(
            client.connect(&[]).await,
            Err(ClusterError::NoMasters)
        ));
        let handle = client
            .connect(&[HostPort::new("10.0.0.1", 7100)])
            .await
            .unwrap();
        assert_eq!(handle.masters().len(), 1);
    }

    #[test]
    fn master_url_uses_web_port() {
        let client = YbHttpClient::new(ClusterConfig::default()).unwrap();
        assert_eq!(
            client.master_url(&HostPort::new("10.0.0.1", 7100), "/api/v1/masters"),
            "http://10.0.0.1:7000/api/v1/masters"
        );
    }

    #[test]
    fn tablet_server_payload_deserializes() {
        let raw = r#"{
            "": {
                "10.0.0.2:9000": {"permanent_uuid": "b", "status": "ALIVE", "time_since_hb_sec": 0.4},
                "10.0.0.1:9000": {"permanent_uuid": "a", "status": "DEAD", "time_since_hb_sec": 120.0}
            }
        }"#;
        let parsed: TabletServersResponse = serde_json::from_str(raw).unwrap();
        let servers = parsed.get("").unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(
            servers.get("10.0.0.1:9000").unwrap().status.as_deref(),
            Some("DEAD")
        );
    }

    #[test]
    fn masters_payload_tolerates_missing_role() {
        let raw = r#"{"masters": [{"instance_id": {}}, {"role": "LEADER"}]}"#;
        let parsed: MastersResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.masters.len(), 2);
        assert!(parsed.masters[0].role.is_none());
    }
}

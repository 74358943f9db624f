use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    bounded, checks_failed, lost_race, CheckReport, ImportError, ImportPhase, UniverseImporter,
    CHECK_FIND_TSERVERS_LIST, CHECK_TSERVERS_ARE_RUNNING, CHECK_TSERVER_HEARTBEATS,
};
use crate::schemas::{ImportRequest, ImportResponse};
use crate::services::cluster::{DataNode, DataNodeListing, DataNodeStatus};
use crate::services::universe_store::{NodeDetails, UniverseRecord};

/// Status recorded for nodes that passed the liveness checks
pub const NODE_STATUS_LIVE: &str = "Live";

/// Every discovered tablet server must report itself alive
pub fn check_tservers_running(nodes: &[DataNode]) -> Result<(), String> {
    let down: Vec<String> = nodes
        .iter()
        .filter(|n| n.status != DataNodeStatus::Alive)
        .map(|n| n.address.to_string())
        .collect();
    if down.is_empty() {
        Ok(())
    } else {
        Err(format!("Tablet servers not alive: {}", down.join(",")))
    }
}

/// Every discovered tablet server must have heartbeated within `max_age` of `now`
pub fn check_heartbeats(
    nodes: &[DataNode],
    now: DateTime<Utc>,
    max_age: Duration,
) -> Result<(), String> {
    let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
    let stale: Vec<String> = nodes
        .iter()
        .filter(|n| now.signed_duration_since(n.last_heartbeat) > max_age)
        .map(|n| n.address.to_string())
        .collect();
    if stale.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Tablet servers with stale heartbeats (older than {}ms): {}",
            max_age.num_milliseconds(),
            stale.join(",")
        ))
    }
}

/// Node metadata in discovery order, indices starting at 1
pub fn materialize_nodes(universe_name: &str, nodes: &[DataNode]) -> Vec<NodeDetails> {
    nodes
        .iter()
        .zip(1u32..)
        .map(|(node, idx)| NodeDetails {
            node_idx: idx,
            node_name: NodeDetails::node_name_for(universe_name, idx),
            private_ip: node.address.host.clone(),
            rpc_port: node.address.port,
            status: NODE_STATUS_LIVE.to_string(),
        })
        .collect()
}

impl UniverseImporter {
    pub(super) async fn import_tservers(
        &self,
        id: Uuid,
        request: &ImportRequest,
    ) -> Result<ImportResponse, ImportError> {
        let phase = ImportPhase::Tservers(id);
        let universe = self.load_for_phase(id, phase, request).await?;
        let mut checks = CheckReport::new();

        let Some(listing) =
            checks.record(CHECK_FIND_TSERVERS_LIST, self.find_tservers(&universe).await)
        else {
            return Err(checks_failed(Some(id), universe.state, checks));
        };

        if checks
            .record(CHECK_TSERVERS_ARE_RUNNING, check_tservers_running(&listing.nodes))
            .is_none()
        {
            return Err(checks_failed(Some(id), universe.state, checks));
        }

        let heartbeats = check_heartbeats(
            &listing.nodes,
            Utc::now(),
            self.settings.heartbeat_max_age,
        );
        if checks.record(CHECK_TSERVER_HEARTBEATS, heartbeats).is_none() {
            return Err(checks_failed(Some(id), universe.state, checks));
        }

        // Nodes are only written if this call still wins the state swap
        let nodes = materialize_nodes(&universe.name, &listing.nodes);
        let advanced = self
            .store
            .attach_nodes_and_advance(id, &nodes, phase.from_state(), phase.to_state())
            .await?;
        if !advanced {
            return Err(lost_race(id, phase.from_state()));
        }

        tracing::info!(
            "Universe {} '{}': recorded {} tablet servers",
            id,
            universe.name,
            nodes.len()
        );
        Ok(ImportResponse::new(Some(id), phase.to_state(), checks).with_nodes(nodes))
    }

    async fn find_tservers(&self, universe: &UniverseRecord) -> Result<DataNodeListing, String> {
        let handle = self.connect(&universe.master_addresses).await?;
        let listing = bounded(
            self.settings.rpc_timeout,
            self.cluster.list_data_nodes(&handle),
        )
        .await?
        .map_err(|e| e.to_string())?;

        if listing.nodes.is_empty() {
            return Err("No tablet servers found in the cluster".to_string());
        }
        if listing.count != listing.nodes.len() {
            return Err(format!(
                "Cluster reported {} tablet servers but listed {}",
                listing.count,
                listing.nodes.len()
            ));
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cluster::HostPort;

    fn node(ip: &str, status: DataNodeStatus, hb_age_secs: i64, now: DateTime<Utc>) -> DataNode {
        DataNode {
            uuid: format!("uuid-{}", ip),
            address: HostPort::new(ip, 9100),
            status,
            last_heartbeat: now - chrono::Duration::seconds(hb_age_secs),
        }
    }

    #[test]
    fn running_check_lists_dead_nodes() {
        let now = Utc::now();
        let nodes = vec![
            node("10.0.0.1", DataNodeStatus::Alive, 1, now),
            node("10.0.0.2", DataNodeStatus::Dead, 1, now),
        ];
        let err = check_tservers_running(&nodes).unwrap_err();
        assert!(err.contains("10.0.0.2:9100"));
        assert!(!err.contains("10.0.0.1"));
        assert!(check_tservers_running(&nodes[..1]).is_ok());
    }

    #[test]
    fn heartbeat_check_uses_threshold() {
        let now = Utc::now();
        let nodes = vec![
            node("10.0.0.1", DataNodeStatus::Alive, 5, now),
            node("10.0.0.2", DataNodeStatus::Alive, 90, now),
        ];
        assert!(check_heartbeats(&nodes, now, Duration::from_secs(120)).is_ok());
        let err = check_heartbeats(&nodes, now, Duration::from_secs(60)).unwrap_err();
        assert!(err.contains("10.0.0.2"));
    }

    #[test]
    fn nodes_are_indexed_in_discovery_order() {
        let now = Utc::now();
        let discovered = vec![
            node("127.0.0.3", DataNodeStatus::Alive, 0, now),
            node("127.0.0.1", DataNodeStatus::Alive, 0, now),
        ];
        let nodes = materialize_nodes("importUniv", &discovered);
        assert_eq!(nodes[0].node_idx, 1);
        assert_eq!(nodes[0].node_name, "yb-importUniv-n1");
        assert_eq!(nodes[0].private_ip, "127.0.0.3");
        assert_eq!(nodes[1].node_name, "yb-importUniv-n2");
        assert_eq!(nodes[1].rpc_port, 9100);

        // Same topology, same result
        assert_eq!(materialize_nodes("importUniv", &discovered), nodes);
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::ImportState;
use crate::services::cluster::join_host_ports;
use crate::services::universe_store::{NodeDetails, UniverseRecord};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CloudInfo {
    pub private_ip: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetailsResponse {
    pub node_idx: u32,
    pub node_name: String,
    pub state: String,
    pub rpc_port: u16,
    pub cloud_info: CloudInfo,
}

impl From<NodeDetails> for NodeDetailsResponse {
    fn from(node: NodeDetails) -> Self {
        Self {
            node_idx: node.node_idx,
            node_name: node.node_name,
            state: node.status,
            rpc_port: node.rpc_port,
            cloud_info: CloudInfo {
                private_ip: node.private_ip,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UniverseDetails {
    pub node_details_set: Vec<NodeDetailsResponse>,
}

/// Body of `GET /api/universes/{id}`
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UniverseResponse {
    pub universe_id: Uuid,
    pub name: String,
    pub master_addresses: String,
    #[schema(value_type = String)]
    pub state: ImportState,
    pub onboarded: bool,
    pub universe_details: UniverseDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UniverseRecord> for UniverseResponse {
    fn from(universe: UniverseRecord) -> Self {
        let onboarded = universe.is_onboarded();
        Self {
            universe_id: universe.id,
            name: universe.name,
            master_addresses: join_host_ports(&universe.master_addresses),
            state: universe.state,
            onboarded,
            universe_details: UniverseDetails {
                node_details_set: universe.nodes.into_iter().map(Into::into).collect(),
            },
            created_at: universe.created_at,
            updated_at: universe.updated_at,
        }
    }
}

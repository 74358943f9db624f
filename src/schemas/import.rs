use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ImportState;
use crate::services::import::CheckReport;
use crate::services::universe_store::NodeDetails;

/// Body of `POST /api/universes/import`
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default, alias = "universeName")]
    pub cluster_name: String,
    /// Comma separated `host:port` list of seed masters
    #[serde(default)]
    pub master_addresses: String,
    /// Last completed phase; absent on the first call
    #[serde(default, alias = "currentState")]
    pub resumption_token: Option<String>,
    #[serde(default, alias = "universeUUID")]
    pub universe_id: Option<String>,
}

/// Result of one import phase
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe_id: Option<Uuid>,
    #[schema(value_type = String)]
    pub state: ImportState,
    #[schema(value_type = Object)]
    pub checks: CheckReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub nodes_list: Option<Vec<NodeDetails>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_count: Option<usize>,
}

impl ImportResponse {
    pub fn new(universe_id: Option<Uuid>, state: ImportState, checks: CheckReport) -> Self {
        Self {
            universe_id,
            state,
            checks,
            nodes_list: None,
            nodes_count: None,
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeDetails>) -> Self {
        self.nodes_count = Some(nodes.len());
        self.nodes_list = Some(nodes);
        self
    }
}

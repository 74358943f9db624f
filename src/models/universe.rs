use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "universes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    /// Seed master addresses as a comma separated `host:port` list
    pub master_addresses: String,
    /// Import progress, one of the `ImportState` names
    pub state: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::universe_node::Entity")]
    Nodes,
}

impl Related<super::universe_node::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Progress of one import run. The declaration order is the phase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImportState {
    /// Record created, masters not yet verified
    #[serde(rename = "BEGIN", alias = "NONE")]
    Begin,
    #[serde(rename = "IMPORTED_MASTERS")]
    ImportedMasters,
    #[serde(rename = "IMPORTED_TSERVERS")]
    ImportedTservers,
    #[serde(rename = "FINISHED")]
    Finished,
}

impl ImportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportState::Begin => "BEGIN",
            ImportState::ImportedMasters => "IMPORTED_MASTERS",
            ImportState::ImportedTservers => "IMPORTED_TSERVERS",
            ImportState::Finished => "FINISHED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "BEGIN" | "NONE" => Some(ImportState::Begin),
            "IMPORTED_MASTERS" => Some(ImportState::ImportedMasters),
            "IMPORTED_TSERVERS" => Some(ImportState::ImportedTservers),
            "FINISHED" => Some(ImportState::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

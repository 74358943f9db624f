use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "universe_nodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub universe_id: Uuid,
    /// 1-based position in cluster discovery order
    pub node_idx: i32,
    pub node_name: String,
    pub private_ip: String,
    pub rpc_port: i32,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::universe::Entity",
        from = "Column::UniverseId",
        to = "super::universe::Column::Id",
        on_delete = "Cascade"
    )]
    Universe,
}

impl Related<super::universe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Universe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

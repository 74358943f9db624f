//! Persistence of imported universes.
//!
//! `UniverseStore` is the narrow read/write contract the import phases rely
//! on. Two guarantees matter for concurrent callers:
//! - `create_universe` never yields two records for one name; a losing
//!   concurrent insert observes the unique-constraint violation and returns
//!   the winner's record instead.
//! - `set_state` is a compare-and-swap on the persisted state, and
//!   `attach_nodes_and_advance` runs that same swap before touching any node
//!   inside one transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::prelude::*;
use crate::models::{universe, universe_node, ImportState};
use crate::services::cluster::{join_host_ports, parse_host_ports, HostPort};

/// A managed universe as tracked by the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseRecord {
    pub id: Uuid,
    pub name: String,
    pub master_addresses: Vec<HostPort>,
    pub state: ImportState,
    /// Ordered by `node_idx`
    pub nodes: Vec<NodeDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UniverseRecord {
    pub fn is_onboarded(&self) -> bool {
        self.state == ImportState::Finished
    }
}

/// One tablet server of an imported universe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetails {
    pub node_idx: u32,
    pub node_name: String,
    pub private_ip: String,
    pub rpc_port: u16,
    pub status: String,
}

impl NodeDetails {
    /// Node name derived from the universe name and the 1-based index
    pub fn node_name_for(universe_name: &str, node_idx: u32) -> String {
        format!("yb-{}-n{}", universe_name, node_idx)
    }
}

/// Result of `create_universe`
#[derive(Debug, Clone)]
pub struct CreatedUniverse {
    pub universe: UniverseRecord,
    /// False when a record with the same name already existed
    pub created: bool,
}

#[async_trait]
pub trait UniverseStore: Send + Sync {
    /// Create a universe in `BEGIN` state, or return the one already using `name`
    async fn create_universe(
        &self,
        name: &str,
        master_addresses: &[HostPort],
    ) -> Result<CreatedUniverse, DbErr>;

    /// Replace the node set of a universe
    async fn attach_nodes(&self, id: Uuid, nodes: &[NodeDetails]) -> Result<(), DbErr>;

    /// Move `id` from `expected` to `new` and replace its node set atomically.
    /// Returns false, with nothing written, if the persisted state was not `expected`.
    async fn attach_nodes_and_advance(
        &self,
        id: Uuid,
        nodes: &[NodeDetails],
        expected: ImportState,
        new: ImportState,
    ) -> Result<bool, DbErr>;

    /// Point a universe still in `expected` at a new seed set; false if it moved on
    async fn update_master_addresses(
        &self,
        id: Uuid,
        master_addresses: &[HostPort],
        expected: ImportState,
    ) -> Result<bool, DbErr>;

    /// Move `id` from `expected` to `new`; false if the persisted state was not `expected`
    async fn set_state(
        &self,
        id: Uuid,
        expected: ImportState,
        new: ImportState,
    ) -> Result<bool, DbErr>;

    async fn get(&self, id: Uuid) -> Result<Option<UniverseRecord>, DbErr>;

    async fn find_by_name(&self, name: &str) -> Result<Option<UniverseRecord>, DbErr>;

    async fn list(&self) -> Result<Vec<UniverseRecord>, DbErr>;
}

/// `UniverseStore` on top of the application database
#[derive(Clone)]
pub struct DbUniverseStore {
    db: DatabaseConnection,
}

impl DbUniverseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, model: universe::Model) -> Result<UniverseRecord, DbErr> {
        let nodes = UniverseNode::find()
            .filter(universe_node::Column::UniverseId.eq(model.id))
            .order_by_asc(universe_node::Column::NodeIdx)
            .all(&self.db)
            .await?;
        to_record(model, nodes)
    }
}

/// Conditional state update; true when exactly this row moved
async fn swap_state<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    expected: ImportState,
    new: ImportState,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let result = Universe::update_many()
        .col_expr(universe::Column::State, Expr::value(new.as_str()))
        .col_expr(universe::Column::UpdatedAt, Expr::value(now))
        .filter(universe::Column::Id.eq(id))
        .filter(universe::Column::State.eq(expected.as_str()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

async fn replace_nodes<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    nodes: &[NodeDetails],
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    UniverseNode::delete_many()
        .filter(universe_node::Column::UniverseId.eq(id))
        .exec(conn)
        .await?;

    for node in nodes {
        universe_node::ActiveModel {
            universe_id: Set(id),
            node_idx: Set(node.node_idx as i32),
            node_name: Set(node.node_name.clone()),
            private_ip: Set(node.private_ip.clone()),
            rpc_port: Set(i32::from(node.rpc_port)),
            status: Set(node.status.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn to_node(model: universe_node::Model) -> NodeDetails {
    NodeDetails {
        node_idx: model.node_idx.max(0) as u32,
        node_name: model.node_name,
        private_ip: model.private_ip,
        rpc_port: u16::try_from(model.rpc_port).unwrap_or_default(),
        status: model.status,
    }
}

fn to_record(
    model: universe::Model,
    nodes: Vec<universe_node::Model>,
) -> Result<UniverseRecord, DbErr> {
    let state = ImportState::parse(&model.state).ok_or_else(|| {
        DbErr::Custom(format!(
            "Universe {} has unknown state {}",
            model.id, model.state
        ))
    })?;
    let master_addresses = parse_host_ports(&model.master_addresses)
        .map_err(|e| DbErr::Custom(format!("Universe {}: {}", model.id, e)))?;

    Ok(UniverseRecord {
        id: model.id,
        name: model.name,
        master_addresses,
        state,
        nodes: nodes.into_iter().map(to_node).collect(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

#[async_trait]
impl UniverseStore for DbUniverseStore {
    async fn create_universe(
        &self,
        name: &str,
        master_addresses: &[HostPort],
    ) -> Result<CreatedUniverse, DbErr> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(CreatedUniverse {
                universe: existing,
                created: false,
            });
        }

        let now = Utc::now();
        let row = universe::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            master_addresses: Set(join_host_ports(master_addresses)),
            state: Set(ImportState::Begin.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match row.insert(&self.db).await {
            Ok(model) => Ok(CreatedUniverse {
                universe: to_record(model, Vec::new())?,
                created: true,
            }),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // Lost the race against a concurrent import of the same name
                tracing::debug!("Universe {} created concurrently, reusing it", name);
                let existing = self.find_by_name(name).await?.ok_or(e)?;
                Ok(CreatedUniverse {
                    universe: existing,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn attach_nodes(&self, id: Uuid, nodes: &[NodeDetails]) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        replace_nodes(&txn, id, nodes, now).await?;
        Universe::update_many()
            .col_expr(universe::Column::UpdatedAt, Expr::value(now))
            .filter(universe::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await
    }

    async fn attach_nodes_and_advance(
        &self,
        id: Uuid,
        nodes: &[NodeDetails],
        expected: ImportState,
        new: ImportState,
    ) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let swapped = swap_state(&txn, id, expected, new, now).await?;
        if !swapped {
            txn.rollback().await?;
            return Ok(false);
        }

        replace_nodes(&txn, id, nodes, now).await?;
        txn.commit().await?;
        Ok(true)
    }

    async fn update_master_addresses(
        &self,
        id: Uuid,
        master_addresses: &[HostPort],
        expected: ImportState,
    ) -> Result<bool, DbErr> {
        let result = Universe::update_many()
            .col_expr(
                universe::Column::MasterAddresses,
                Expr::value(join_host_ports(master_addresses)),
            )
            .col_expr(universe::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(universe::Column::Id.eq(id))
            .filter(universe::Column::State.eq(expected.as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn set_state(
        &self,
        id: Uuid,
        expected: ImportState,
        new: ImportState,
    ) -> Result<bool, DbErr> {
        swap_state(&self.db, id, expected, new, Utc::now()).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<UniverseRecord>, DbErr> {
        match Universe::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(self.load(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<UniverseRecord>, DbErr> {
        let model = Universe::find()
            .filter(universe::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        match model {
            Some(model) => Ok(Some(self.load(model).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<UniverseRecord>, DbErr> {
        let universes = Universe::find()
            .order_by_asc(universe::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let nodes = UniverseNode::find()
            .order_by_asc(universe_node::Column::NodeIdx)
            .all(&self.db)
            .await?;

        let mut by_universe: HashMap<Uuid, Vec<universe_node::Model>> = HashMap::new();
        for node in nodes {
            by_universe.entry(node.universe_id).or_default().push(node);
        }

        universes
            .into_iter()
            .map(|u| {
                let nodes = by_universe.remove(&u.id).unwrap_or_default();
                to_record(u, nodes)
            })
            .collect()
    }
}

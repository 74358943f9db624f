//! Test helpers and utilities for integration testing.
//!
//! Provides an in-memory database with migrations applied, a scriptable
//! cluster that never touches the network, and a scrape config writer that
//! records what it was asked to write.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tower::util::ServiceExt;
use uuid::Uuid;

use universe_import::config::cluster::ClusterConfig;
use universe_import::endpoints::create_router;
use universe_import::error::{AppError, Result as AppResult};
use universe_import::migrations::Migrator;
use universe_import::schemas::ImportRequest;
use universe_import::services::cluster::{
    ClusterClient, ClusterError, ClusterHandle, DataNode, DataNodeListing, DataNodeStatus,
    HostPort,
};
use universe_import::services::import::UniverseImporter;
use universe_import::services::monitoring::ScrapeConfigWriter;
use universe_import::services::universe_store::{DbUniverseStore, UniverseRecord, UniverseStore};
use universe_import::state::AppState;

pub const MASTERS: &str = "127.0.0.1:7100,127.0.0.2:7100,127.0.0.3:7100";
pub const UNIVERSE_NAME: &str = "importUniv";

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Short timeouts so failing checks resolve quickly
pub fn test_settings() -> ClusterConfig {
    ClusterConfig {
        master_reachable_timeout: Duration::from_millis(200),
        leader_election_timeout: Duration::from_millis(200),
        rpc_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(10),
        ..ClusterConfig::default()
    }
}

/// Tablet server as the fake master reports it
pub fn data_node(ip: &str, status: DataNodeStatus, heartbeat_age: Duration) -> DataNode {
    let age = chrono::Duration::from_std(heartbeat_age).expect("heartbeat age in range");
    DataNode {
        uuid: format!("ts-{}", ip),
        address: HostPort::new(ip, 9100),
        status,
        last_heartbeat: Utc::now() - age,
    }
}

struct FakeClusterState {
    unreachable: Vec<HostPort>,
    leader: bool,
    listing: DataNodeListing,
    connects: usize,
}

/// `ClusterClient` answering from scripted state
#[derive(Clone)]
pub struct FakeCluster {
    inner: Arc<Mutex<FakeClusterState>>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCluster {
    /// Healthy cluster: every master reachable, a leader, three live tablet servers
    pub fn new() -> Self {
        let nodes = ["127.0.0.1", "127.0.0.2", "127.0.0.3"]
            .iter()
            .map(|ip| data_node(ip, DataNodeStatus::Alive, Duration::from_secs(1)))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(FakeClusterState {
                unreachable: Vec::new(),
                leader: true,
                listing: DataNodeListing::new(nodes),
                connects: 0,
            })),
        }
    }

    pub fn set_unreachable(&self, master: HostPort) {
        self.inner.lock().unreachable.push(master);
    }

    pub fn set_all_reachable(&self) {
        self.inner.lock().unreachable.clear();
    }

    pub fn set_leader(&self, leader: bool) {
        self.inner.lock().leader = leader;
    }

    pub fn set_nodes(&self, nodes: Vec<DataNode>) {
        self.inner.lock().listing = DataNodeListing::new(nodes);
    }

    pub fn set_listing(&self, listing: DataNodeListing) {
        self.inner.lock().listing = listing;
    }

    pub fn connects(&self) -> usize {
        self.inner.lock().connects
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn connect(&self, masters: &[HostPort]) -> Result<ClusterHandle, ClusterError> {
        if masters.is_empty() {
            return Err(ClusterError::NoMasters);
        }
        self.inner.lock().connects += 1;
        Ok(ClusterHandle::new(masters.to_vec()))
    }

    async fn wait_for_reachable(
        &self,
        _handle: &ClusterHandle,
        server: &HostPort,
        _timeout: Duration,
    ) -> bool {
        !self.inner.lock().unreachable.contains(server)
    }

    async fn wait_for_leader(&self, _handle: &ClusterHandle, _timeout: Duration) -> bool {
        self.inner.lock().leader
    }

    async fn list_data_nodes(
        &self,
        _handle: &ClusterHandle,
    ) -> Result<DataNodeListing, ClusterError> {
        Ok(self.inner.lock().listing.clone())
    }
}

/// `ScrapeConfigWriter` that keeps the universes it was handed
#[derive(Clone, Default)]
pub struct RecordingScrapeWriter {
    written: Arc<Mutex<Vec<UniverseRecord>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingScrapeWriter {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    pub fn written(&self) -> Vec<UniverseRecord> {
        self.written.lock().clone()
    }
}

#[async_trait]
impl ScrapeConfigWriter for RecordingScrapeWriter {
    async fn write_scrape_config(&self, universe: &UniverseRecord) -> AppResult<()> {
        if *self.fail.lock() {
            return Err(AppError::Internal("Prometheus targets dir not writable".to_string()));
        }
        self.written.lock().push(universe.clone());
        Ok(())
    }
}

/// Everything a test needs to drive imports and inspect their effects
pub struct TestHarness {
    pub db: DatabaseConnection,
    pub cluster: FakeCluster,
    pub monitoring: RecordingScrapeWriter,
    pub state: AppState,
}

impl TestHarness {
    pub async fn new() -> Self {
        let db = create_test_db().await;
        let cluster = FakeCluster::new();
        let monitoring = RecordingScrapeWriter::default();
        let state = build_app_state(db.clone(), &cluster, &monitoring);
        Self {
            db,
            cluster,
            monitoring,
            state,
        }
    }

    pub fn importer(&self) -> &UniverseImporter {
        &self.state.importer
    }

    pub fn store(&self) -> DbUniverseStore {
        DbUniverseStore::new(self.db.clone())
    }

    pub async fn universe(&self, id: Uuid) -> UniverseRecord {
        self.store()
            .get(id)
            .await
            .expect("store read")
            .expect("universe exists")
    }
}

/// Build an AppState around the fakes
pub fn build_app_state(
    db: DatabaseConnection,
    cluster: &FakeCluster,
    monitoring: &RecordingScrapeWriter,
) -> AppState {
    AppState::new(
        db,
        Arc::new(cluster.clone()),
        Arc::new(monitoring.clone()),
        test_settings(),
    )
}

pub fn masters_request() -> ImportRequest {
    ImportRequest {
        cluster_name: UNIVERSE_NAME.to_string(),
        master_addresses: MASTERS.to_string(),
        ..Default::default()
    }
}

pub fn resume_request(token: &str, universe_id: Uuid) -> ImportRequest {
    ImportRequest {
        cluster_name: UNIVERSE_NAME.to_string(),
        master_addresses: MASTERS.to_string(),
        resumption_token: Some(token.to_string()),
        universe_id: Some(universe_id.to_string()),
    }
}

/// Send a request through the router and decode the JSON body
pub async fn send_json(
    state: AppState,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().uri(uri).method(method);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    (status, json)
}

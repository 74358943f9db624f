use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::cluster::ClusterConfig;
use crate::config::monitoring::MonitoringConfig;
use crate::services::cluster::{ClusterClient, ClusterError};
use crate::services::import::UniverseImporter;
use crate::services::monitoring::{FileScrapeConfigWriter, ScrapeConfigWriter};
use crate::services::universe_store::{DbUniverseStore, UniverseStore};
use crate::services::yb_client::YbHttpClient;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub importer: UniverseImporter,
}

impl AppState {
    /// Wire the importer from explicit collaborators
    pub fn new(
        db: DbConn,
        cluster: Arc<dyn ClusterClient>,
        monitoring: Arc<dyn ScrapeConfigWriter>,
        settings: ClusterConfig,
    ) -> Self {
        let store: Arc<dyn UniverseStore> = Arc::new(DbUniverseStore::new(db.clone()));
        let importer = UniverseImporter::new(store, cluster, monitoring, settings);
        Self { db, importer }
    }

    /// Production wiring: HTTP cluster client and file based scrape targets
    pub fn from_config(
        db: DbConn,
        cluster: ClusterConfig,
        monitoring: MonitoringConfig,
    ) -> Result<Self, ClusterError> {
        let client = YbHttpClient::new(cluster.clone())?;
        Ok(Self::new(
            db,
            Arc::new(client),
            Arc::new(FileScrapeConfigWriter::new(monitoring)),
            cluster,
        ))
    }

    pub fn store(&self) -> &Arc<dyn UniverseStore> {
        self.importer.store()
    }
}

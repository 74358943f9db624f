//! Universe import state machine.
//!
//! An import is driven by the caller in three calls, one phase each:
//!
//! | persisted state   | token             | phase    | on success        |
//! |-------------------|-------------------|----------|-------------------|
//! | (none) / BEGIN    | absent            | masters  | IMPORTED_MASTERS  |
//! | IMPORTED_MASTERS  | IMPORTED_MASTERS  | tservers | IMPORTED_TSERVERS |
//! | IMPORTED_TSERVERS | IMPORTED_TSERVERS | finish   | FINISHED          |
//!
//! The persisted state is authoritative. The caller's token only selects the
//! phase and acts as the expected value of the final compare-and-swap, so a
//! stale or concurrent call fails with a conflict instead of re-running a
//! phase. A failed check leaves earlier side effects in place so the same
//! phase can simply be resubmitted.

mod checks;
mod error;
mod finish;
mod masters;
mod tservers;
pub mod validator;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

pub use checks::{CheckOutcome, CheckReport};
pub use error::ImportError;
pub use tservers::{check_heartbeats, check_tservers_running, materialize_nodes};
pub use validator::{resolve_phase, ImportPhase, UNIVERSE_UUID_REQUIRED};

use crate::config::cluster::ClusterConfig;
use crate::models::ImportState;
use crate::schemas::{ImportRequest, ImportResponse};
use crate::services::cluster::{ClusterClient, ClusterHandle, HostPort};
use crate::services::monitoring::ScrapeConfigWriter;
use crate::services::universe_store::{UniverseRecord, UniverseStore};

pub const CHECK_CREATE_DB_ENTRY: &str = "create_db_entry";
pub const CHECK_MASTERS_ARE_RUNNING: &str = "check_masters_are_running";
pub const CHECK_MASTER_LEADER_ELECTION: &str = "check_master_leader_election";
pub const CHECK_FIND_TSERVERS_LIST: &str = "find_tservers_list";
pub const CHECK_TSERVERS_ARE_RUNNING: &str = "check_tservers_are_running";
pub const CHECK_TSERVER_HEARTBEATS: &str = "check_tserver_heartbeats";
pub const CHECK_CREATE_PROMETHEUS_CONFIG: &str = "create_prometheus_config";

/// Runs import phases against the store, the cluster and the monitoring writer
#[derive(Clone)]
pub struct UniverseImporter {
    store: Arc<dyn UniverseStore>,
    cluster: Arc<dyn ClusterClient>,
    monitoring: Arc<dyn ScrapeConfigWriter>,
    settings: ClusterConfig,
}

impl UniverseImporter {
    pub fn new(
        store: Arc<dyn UniverseStore>,
        cluster: Arc<dyn ClusterClient>,
        monitoring: Arc<dyn ScrapeConfigWriter>,
        settings: ClusterConfig,
    ) -> Self {
        Self {
            store,
            cluster,
            monitoring,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn UniverseStore> {
        &self.store
    }

    /// Run the phase selected by the request's resumption token
    pub async fn import_universe(
        &self,
        request: &ImportRequest,
    ) -> Result<ImportResponse, ImportError> {
        let phase = resolve_phase(request)?;
        tracing::info!(
            "Import of '{}': running {} phase",
            request.cluster_name.trim(),
            phase.name()
        );

        let result = match phase {
            ImportPhase::Masters => self.import_masters(request).await,
            ImportPhase::Tservers(id) => self.import_tservers(id, request).await,
            ImportPhase::Finish(id) => self.finish_import(id, request).await,
        };

        match &result {
            Ok(response) => tracing::info!(
                "Import {} phase done, universe {:?} now {}",
                phase.name(),
                response.universe_id,
                response.state
            ),
            Err(e) => tracing::warn!("Import {} phase failed: {}", phase.name(), e),
        }
        result
    }

    /// Load the universe a later phase works on and check it is where the caller resumed
    async fn load_for_phase(
        &self,
        id: Uuid,
        phase: ImportPhase,
        request: &ImportRequest,
    ) -> Result<UniverseRecord, ImportError> {
        let expected = phase.from_state();
        let universe = self
            .store
            .get(id)
            .await?
            .ok_or(ImportError::UniverseNotFound(id))?;

        let requested_name = request.cluster_name.trim();
        if !requested_name.is_empty() && requested_name != universe.name {
            return Err(ImportError::Validation(format!(
                "Cluster name '{}' does not match universe {} ('{}').",
                requested_name, id, universe.name
            )));
        }

        if universe.state != expected {
            return Err(ImportError::StateConflict(format!(
                "Universe {} is in state {}, cannot resume from {}.",
                id, universe.state, expected
            )));
        }

        Ok(universe)
    }

    /// Compare-and-advance the persisted state past `phase`
    async fn advance(&self, id: Uuid, phase: ImportPhase) -> Result<(), ImportError> {
        let from = phase.from_state();
        if self.store.set_state(id, from, phase.to_state()).await? {
            Ok(())
        } else {
            Err(lost_race(id, from))
        }
    }

    async fn connect(&self, masters: &[HostPort]) -> Result<ClusterHandle, String> {
        bounded(self.settings.rpc_timeout, self.cluster.connect(masters))
            .await?
            .map_err(|e| e.to_string())
    }
}

fn lost_race(id: Uuid, from: ImportState) -> ImportError {
    ImportError::StateConflict(format!(
        "Universe {} is no longer in state {}; another import call advanced it.",
        id, from
    ))
}

/// Failure carrying the partial report, with state as persisted
fn checks_failed(universe_id: Option<Uuid>, state: ImportState, checks: CheckReport) -> ImportError {
    let message = match checks.failure() {
        Some((name, msg)) => format!("Check {} failed: {}", name, msg),
        None => "Import checks failed".to_string(),
    };
    ImportError::ChecksFailed {
        message,
        response: Box::new(ImportResponse::new(universe_id, state, checks)),
    }
}

/// Storage failure inside a check, carrying the partial report
fn storage_failed(state: ImportState, checks: CheckReport) -> ImportError {
    let check = checks.failure().map(|(name, _)| name).unwrap_or("import");
    ImportError::StorageFailed {
        check,
        response: Box::new(ImportResponse::new(None, state, checks)),
    }
}

/// Run `fut` with an upper bound on its duration
async fn bounded<F: Future>(limit: Duration, fut: F) -> Result<F::Output, String> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| format!("timed out after {}ms", limit.as_millis()))
}

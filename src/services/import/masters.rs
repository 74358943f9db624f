use sea_orm::DbErr;

use super::{
    bounded, checks_failed, storage_failed, CheckReport, ImportError, ImportPhase,
    UniverseImporter, CHECK_CREATE_DB_ENTRY, CHECK_MASTERS_ARE_RUNNING,
    CHECK_MASTER_LEADER_ELECTION,
};
use crate::models::ImportState;
use crate::schemas::{ImportRequest, ImportResponse};
use crate::services::cluster::{join_host_ports, parse_host_ports, ClusterHandle, HostPort};
use crate::services::universe_store::UniverseRecord;

fn same_addresses(a: &[HostPort], b: &[HostPort]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

impl UniverseImporter {
    pub(super) async fn import_masters(
        &self,
        request: &ImportRequest,
    ) -> Result<ImportResponse, ImportError> {
        let phase = ImportPhase::Masters;
        let name = request.cluster_name.trim();
        let masters = parse_host_ports(&request.master_addresses)?;

        let mut checks = CheckReport::new();

        let entry = self
            .create_db_entry(name, &masters)
            .await
            .map_err(|e| e.to_string());
        let Some(universe) = checks.record(CHECK_CREATE_DB_ENTRY, entry) else {
            return Err(storage_failed(phase.from_state(), checks));
        };
        let id = universe.id;
        if universe.state != phase.from_state() {
            return Err(ImportError::StateConflict(format!(
                "Universe '{}' was already imported as {} and is in state {}.",
                name, id, universe.state
            )));
        }

        let Some(handle) =
            checks.record(CHECK_MASTERS_ARE_RUNNING, self.masters_running(&masters).await)
        else {
            return Err(checks_failed(Some(id), universe.state, checks));
        };

        if checks
            .record(CHECK_MASTER_LEADER_ELECTION, self.leader_elected(&handle).await)
            .is_none()
        {
            return Err(checks_failed(Some(id), universe.state, checks));
        }

        self.advance(id, phase).await?;
        Ok(ImportResponse::new(Some(id), phase.to_state(), checks))
    }

    /// Create the record, or pick up the one left by an earlier attempt with the same name.
    ///
    /// An attempt that is still in `BEGIN` takes the seed addresses of the
    /// latest request, so a typo in an earlier attempt can be corrected.
    async fn create_db_entry(
        &self,
        name: &str,
        masters: &[HostPort],
    ) -> Result<UniverseRecord, DbErr> {
        let created = self.store.create_universe(name, masters).await?;
        let universe = created.universe;

        if created.created {
            tracing::info!(
                "Created universe {} '{}' with masters {}",
                universe.id,
                name,
                join_host_ports(masters)
            );
            return Ok(universe);
        }
        if universe.state != ImportState::Begin
            || same_addresses(&universe.master_addresses, masters)
        {
            tracing::info!("Resuming import of universe {} '{}'", universe.id, name);
            return Ok(universe);
        }

        let id = universe.id;
        if self
            .store
            .update_master_addresses(id, masters, ImportState::Begin)
            .await?
        {
            tracing::info!(
                "Universe {} '{}' masters changed from {} to {}",
                id,
                name,
                join_host_ports(&universe.master_addresses),
                join_host_ports(masters)
            );
        }
        // Re-read either way; a lost update means another call moved it past BEGIN
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Universe {}", id)))
    }

    async fn masters_running(&self, masters: &[HostPort]) -> Result<ClusterHandle, String> {
        let handle = self.connect(masters).await?;
        let timeout = self.settings.master_reachable_timeout;

        for master in masters {
            let reachable = bounded(
                timeout,
                self.cluster.wait_for_reachable(&handle, master, timeout),
            )
            .await
            .unwrap_or(false);
            if !reachable {
                return Err(format!(
                    "Master {} is not reachable within {}ms",
                    master,
                    timeout.as_millis()
                ));
            }
        }
        Ok(handle)
    }

    async fn leader_elected(&self, handle: &ClusterHandle) -> Result<(), String> {
        let timeout = self.settings.leader_election_timeout;
        let elected = bounded(timeout, self.cluster.wait_for_leader(handle, timeout))
            .await
            .unwrap_or(false);
        if elected {
            Ok(())
        } else {
            Err(format!(
                "No master leader elected within {}ms",
                timeout.as_millis()
            ))
        }
    }
}

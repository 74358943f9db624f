use uuid::Uuid;

use super::{
    bounded, checks_failed, CheckReport, ImportError, ImportPhase, UniverseImporter,
    CHECK_CREATE_PROMETHEUS_CONFIG,
};
use crate::schemas::{ImportRequest, ImportResponse};
use crate::services::universe_store::UniverseRecord;

impl UniverseImporter {
    pub(super) async fn finish_import(
        &self,
        id: Uuid,
        request: &ImportRequest,
    ) -> Result<ImportResponse, ImportError> {
        let phase = ImportPhase::Finish(id);
        let universe = self.load_for_phase(id, phase, request).await?;
        let mut checks = CheckReport::new();

        if checks
            .record(
                CHECK_CREATE_PROMETHEUS_CONFIG,
                self.create_prometheus_config(&universe).await,
            )
            .is_none()
        {
            return Err(checks_failed(Some(id), universe.state, checks));
        }

        self.advance(id, phase).await?;

        tracing::info!("Universe {} '{}' is onboarded", id, universe.name);
        Ok(ImportResponse::new(Some(id), phase.to_state(), checks))
    }

    async fn create_prometheus_config(&self, universe: &UniverseRecord) -> Result<(), String> {
        bounded(
            self.settings.rpc_timeout,
            self.monitoring.write_scrape_config(universe),
        )
        .await?
        .map_err(|e| e.to_string())
    }
}

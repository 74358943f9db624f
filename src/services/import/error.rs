use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::schemas::ImportResponse;
use crate::services::cluster::HostPortParseError;

/// Failures of an import call, by how the caller should react
#[derive(Debug, Error)]
pub enum ImportError {
    /// Missing or illegal request fields for the resolved phase
    #[error("{0}")]
    Validation(String),

    /// Resumption token that names no phase that can still run
    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Parse(#[from] HostPortParseError),

    #[error("Universe {0} not found")]
    UniverseNotFound(Uuid),

    /// Persisted state did not match what the caller resumed from
    #[error("{0}")]
    StateConflict(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DbErr),

    /// Storage broke while a named check ran; carries the partial report
    #[error("Check {check} failed: storage error")]
    StorageFailed {
        check: &'static str,
        response: Box<ImportResponse>,
    },

    /// A named check failed; carries the partial report
    #[error("{message}")]
    ChecksFailed {
        message: String,
        response: Box<ImportResponse>,
    },
}

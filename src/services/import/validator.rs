//! Maps a request's resumption token to the phase it may run.

use uuid::Uuid;

use super::ImportError;
use crate::models::ImportState;
use crate::schemas::ImportRequest;

pub const UNIVERSE_UUID_REQUIRED: &str = "Valid universe uuid needs to be set.";

/// The phase a request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Masters,
    Tservers(Uuid),
    Finish(Uuid),
}

impl ImportPhase {
    /// Persisted state the universe must be in for this phase to run
    pub fn from_state(&self) -> ImportState {
        match self {
            ImportPhase::Masters => ImportState::Begin,
            ImportPhase::Tservers(_) => ImportState::ImportedMasters,
            ImportPhase::Finish(_) => ImportState::ImportedTservers,
        }
    }

    /// Persisted state a successful run of this phase leaves behind
    pub fn to_state(&self) -> ImportState {
        match self {
            ImportPhase::Masters => ImportState::ImportedMasters,
            ImportPhase::Tservers(_) => ImportState::ImportedTservers,
            ImportPhase::Finish(_) => ImportState::Finished,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImportPhase::Masters => "masters",
            ImportPhase::Tservers(_) => "tservers",
            ImportPhase::Finish(_) => "finish",
        }
    }
}

/// Resolve the phase for `request`. Performs no I/O.
pub fn resolve_phase(request: &ImportRequest) -> Result<ImportPhase, ImportError> {
    let token = request
        .resumption_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let state = match token {
        None => ImportState::Begin,
        Some(t) => ImportState::parse(t)
            .ok_or_else(|| ImportError::InvalidState(format!("Invalid import state: {}", t)))?,
    };

    match state {
        ImportState::Begin => {
            if request.cluster_name.trim().is_empty() {
                return Err(ImportError::Validation(
                    "Cluster name needs to be set.".to_string(),
                ));
            }
            if request.master_addresses.trim().is_empty() {
                return Err(ImportError::Validation(
                    "Master addresses need to be set.".to_string(),
                ));
            }
            Ok(ImportPhase::Masters)
        }
        ImportState::ImportedMasters => Ok(ImportPhase::Tservers(required_universe_id(request)?)),
        ImportState::ImportedTservers => Ok(ImportPhase::Finish(required_universe_id(request)?)),
        ImportState::Finished => Err(ImportError::InvalidState(
            "Universe import is already finished.".to_string(),
        )),
    }
}

fn required_universe_id(request: &ImportRequest) -> Result<Uuid, ImportError> {
    request
        .universe_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .ok_or_else(|| ImportError::Validation(UNIVERSE_UUID_REQUIRED.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(token: Option<&str>, universe_id: Option<&str>) -> ImportRequest {
        ImportRequest {
            cluster_name: "importUniv".to_string(),
            master_addresses: "127.0.0.1:7100".to_string(),
            resumption_token: token.map(str::to_string),
            universe_id: universe_id.map(str::to_string),
        }
    }

    #[test]
    fn absent_token_starts_with_masters() {
        assert_eq!(resolve_phase(&request(None, None)).unwrap(), ImportPhase::Masters);
        assert_eq!(resolve_phase(&request(Some(""), None)).unwrap(), ImportPhase::Masters);
        assert_eq!(
            resolve_phase(&request(Some("BEGIN"), None)).unwrap(),
            ImportPhase::Masters
        );
    }

    #[test]
    fn later_phases_need_universe_id() {
        for token in ["IMPORTED_MASTERS", "IMPORTED_TSERVERS"] {
            let err = resolve_phase(&request(Some(token), None)).unwrap_err();
            assert_eq!(err.to_string(), UNIVERSE_UUID_REQUIRED);

            let err = resolve_phase(&request(Some(token), Some("not-a-uuid"))).unwrap_err();
            assert!(matches!(err, ImportError::Validation(_)));
        }
    }

    #[test]
    fn tokens_map_to_next_phase() {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        assert_eq!(
            resolve_phase(&request(Some("IMPORTED_MASTERS"), Some(&id_str))).unwrap(),
            ImportPhase::Tservers(id)
        );
        assert_eq!(
            resolve_phase(&request(Some("IMPORTED_TSERVERS"), Some(&id_str))).unwrap(),
            ImportPhase::Finish(id)
        );
    }

    #[test]
    fn finished_and_unknown_tokens_are_rejected() {
        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            resolve_phase(&request(Some("FINISHED"), Some(&id))),
            Err(ImportError::InvalidState(_))
        ));
        assert!(matches!(
            resolve_phase(&request(Some("SOMETHING_ELSE"), Some(&id))),
            Err(ImportError::InvalidState(_))
        ));
    }

    #[test]
    fn masters_phase_requires_name_and_addresses() {
        let mut req = request(None, None);
        req.cluster_name = "  ".to_string();
        assert!(matches!(resolve_phase(&req), Err(ImportError::Validation(_))));

        let mut req = request(None, None);
        req.master_addresses = String::new();
        assert!(matches!(resolve_phase(&req), Err(ImportError::Validation(_))));
    }

    #[test]
    fn phase_reports_required_state() {
        let id = Uuid::new_v4();
        assert_eq!(ImportPhase::Masters.from_state(), ImportState::Begin);
        assert_eq!(ImportPhase::Tservers(id).from_state(), ImportState::ImportedMasters);
        assert_eq!(ImportPhase::Finish(id).from_state(), ImportState::ImportedTservers);
        assert_eq!(ImportPhase::Finish(id).to_state(), ImportState::Finished);
        for phase in [ImportPhase::Masters, ImportPhase::Tservers(id)] {
            assert!(phase.from_state() < phase.to_state());
        }
    }
}

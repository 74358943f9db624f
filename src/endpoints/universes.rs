//! Universe import endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::schemas::{ImportRequest, ImportResponse, UniverseResponse};
use crate::state::AppState;

/// Create the universe routes
pub fn universes_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/universes", get(list_universes))
        .route("/api/universes/import", post(import_universe))
        .route("/api/universes/{id}", get(get_universe))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Run the next phase of a universe import
#[utoipa::path(
    post,
    path = "/api/universes/import",
    tag = "Universes",
    request_body = ImportRequest,
    responses(
        (status = 200, body = ImportResponse),
        (status = 400, description = "Validation error or failed check"),
        (status = 404, description = "Universe not found"),
        (status = 409, description = "Universe is not in the expected state")
    )
)]
pub async fn import_universe(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>> {
    let response = state.importer.import_universe(&req).await?;
    Ok(Json(response))
}

/// Get an imported universe with its nodes
#[utoipa::path(
    get,
    path = "/api/universes/{id}",
    tag = "Universes",
    params(("id" = String, Path, description = "Universe uuid")),
    responses(
        (status = 200, body = UniverseResponse),
        (status = 404, description = "Universe not found")
    )
)]
pub async fn get_universe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UniverseResponse>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest(format!("Invalid universe uuid: {}", id)))?;

    let universe = state
        .store()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Universe {} not found", id)))?;

    Ok(Json(universe.into()))
}

/// List all universes known to the inventory
#[utoipa::path(
    get,
    path = "/api/universes",
    tag = "Universes",
    responses(
        (status = 200, body = Vec<UniverseResponse>)
    )
)]
pub async fn list_universes(State(state): State<AppState>) -> Result<Json<Vec<UniverseResponse>>> {
    let universes = state.store().list().await?;
    Ok(Json(universes.into_iter().map(Into::into).collect()))
}

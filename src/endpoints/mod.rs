pub mod universes;

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::config::CONFIG;
use crate::schemas::{
    CloudInfo, ImportRequest, ImportResponse, NodeDetailsResponse, UniverseDetails,
    UniverseResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        get_version,
        universes::import_universe,
        universes::get_universe,
        universes::list_universes,
    ),
    components(schemas(
        ImportRequest,
        ImportResponse,
        UniverseResponse,
        UniverseDetails,
        NodeDetailsResponse,
        CloudInfo,
    )),
    tags((name = "Universes", description = "Universe import and inventory"))
)]
pub struct ApiDoc;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/system/health", get(health_check))
        .route("/api/system/version", get(get_version))
        .route("/api/openapi.json", get(openapi_json))
        .merge(universes::universes_routes(state))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "System",
    responses((status = 200, body = String))
)]
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
#[utoipa::path(
    get,
    path = "/api/system/version",
    tag = "System",
    responses((status = 200, body = serde_json::Value))
)]
async fn get_version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": CONFIG.version,
        "commit_hash": CONFIG.commit_hash,
        "build_time": CONFIG.build_time,
        "backend": "rust"
    }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

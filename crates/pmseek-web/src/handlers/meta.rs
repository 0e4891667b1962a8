//! Liveness endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub status: String,
    pub hint: String,
}

/// GET /healthz
#[utoipa::path(
    get,
    path = "/healthz",
    operation_id = "healthz",
    tag = "meta",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into() })
}

/// GET /
#[utoipa::path(
    get,
    path = "/",
    operation_id = "root",
    tag = "meta",
    responses((status = 200, description = "Service name and where to look next", body = ServiceInfo))
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "PubMed Search Tool".into(),
        status: "ok".into(),
        hint: "See /openapi.json and /search".into(),
    })
}

//! Machine-readable API contract served at `GET /openapi.json`.
//!
//! Tool-calling clients import this document, so operation ids are stable.

use axum::Json;
use utoipa::{OpenApi, ToSchema};

use pmseek_literature::{ArticleRecord, SearchResponse};

use super::{citation, meta, search};

/// Body of every non-2xx response.
#[derive(Debug, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "PubMed Search Tool", version = "1.0.0"),
    paths(
        meta::root,
        meta::healthz,
        search::search,
        citation::search_pubmed,
    ),
    components(schemas(
        ArticleRecord,
        SearchResponse,
        meta::HealthResponse,
        meta::ServiceInfo,
        citation::CitationRequest,
        citation::CitationResponse,
        ErrorBody,
    )),
    tags(
        (name = "pubmed", description = "PubMed literature search"),
        (name = "meta", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// GET /openapi.json
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

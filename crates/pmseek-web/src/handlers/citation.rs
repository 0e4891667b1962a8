//! Citation-string endpoint for chat tools that want plain text instead of JSON.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use pmseek_common::error::ApiError;
use pmseek_literature::citation::{format_citations, CITATION_MAX_RESULTS};
use pmseek_literature::{SearchQuery, SortOrder};

use crate::handlers::openapi::ErrorBody;
use crate::state::SharedState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CitationRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CitationResponse {
    pub formatted_results: String,
}

const MISSING_QUERY: &str = "Missing 'query' in request body";

/// POST /search-pubmed with `{"query": "..."}`
///
/// Returns the most relevant matches, not the newest.
#[utoipa::path(
    post,
    path = "/search-pubmed",
    operation_id = "search_pubmed",
    summary = "Top PubMed matches as plain-text citation blocks",
    tag = "pubmed",
    request_body = CitationRequest,
    responses(
        (status = 200, description = "Citation blocks", body = CitationResponse),
        (status = 400, description = "Missing query", body = ErrorBody),
        (status = 500, description = "PubMed call failed", body = ErrorBody),
    )
)]
pub async fn search_pubmed(
    State(state): State<SharedState>,
    body: Result<Json<CitationRequest>, JsonRejection>,
) -> Result<Json<CitationResponse>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::bad_request(MISSING_QUERY))?;
    let term = body.query.unwrap_or_default();
    let query = SearchQuery::new(&term)
        .map_err(|_| ApiError::bad_request(MISSING_QUERY))?
        .with_max_results(CITATION_MAX_RESULTS, state.search.max_results_limit)
        .with_sort(SortOrder::Relevance);

    let records = state.source.search(&query).await?;
    info!(term = %query.term, count = records.len(), "Formatted PubMed citations");

    Ok(Json(CitationResponse {
        formatted_results: format_citations(&records),
    }))
}

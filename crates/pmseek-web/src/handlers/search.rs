//! PubMed search endpoint.
//! Validates the query string, runs lookup then fetch, and returns the JSON envelope.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;

use pmseek_common::error::ApiError;
use pmseek_literature::{DateBound, SearchQuery, SearchResponse};

use crate::config::SearchSettings;
use crate::handlers::openapi::ErrorBody;
use crate::state::SharedState;

/// Raw query string of `GET /search`. Everything arrives as text so that
/// malformed values produce a JSON 400 rather than a framework rejection.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// PubMed query string
    #[param(required = true)]
    pub q: Option<String>,
    /// Number of results, clamped to 1..=200
    #[param(value_type = Option<i64>)]
    pub max_results: Option<String>,
    /// YYYY or YYYY/MM/DD
    pub mindate: Option<String>,
    /// YYYY or YYYY/MM/DD
    pub maxdate: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn date_param(name: &str, value: Option<&str>) -> Result<Option<DateBound>, ApiError> {
    non_blank(value)
        .map(|raw| {
            DateBound::parse(raw)
                .map_err(|_| ApiError::bad_request(format!("{} must be YYYY or YYYY/MM/DD, got {:?}", name, raw)))
        })
        .transpose()
}

/// Applies validation, defaults and bounds to the raw parameters.
pub fn build_query(params: &SearchParams, settings: &SearchSettings) -> Result<SearchQuery, ApiError> {
    let term = params.q.as_deref().unwrap_or_default();
    let query = SearchQuery::new(term)?;

    let requested = match non_blank(params.max_results.as_deref()) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request(format!("max_results must be an integer, got {:?}", raw)))?,
        None => settings.default_max_results as i64,
    };

    let mindate = date_param("mindate", params.mindate.as_deref())?;
    let maxdate = date_param("maxdate", params.maxdate.as_deref())?;

    Ok(query
        .with_max_results(requested, settings.max_results_limit)
        .with_date_window(mindate, maxdate))
}

/// GET /search?q=&max_results=&mindate=&maxdate=
#[utoipa::path(
    get,
    path = "/search",
    operation_id = "pubmed_search_recent",
    summary = "Search PubMed and return structured results (SORTED BY DATE)",
    tag = "pubmed",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching articles, newest first", body = SearchResponse),
        (status = 400, description = "Missing or malformed parameter", body = ErrorBody),
        (status = 500, description = "PubMed call failed", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub async fn search(
    State(state): State<SharedState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = build_query(&params, &state.search)?;

    info!(term = %query.term, max_results = query.max_results, "PubMed search");
    let records = state.source.search(&query).await?;

    let mut response = SearchResponse::new(params.q.unwrap_or_default(), records);
    if state.search.max_abstract_chars > 0 {
        response = response.truncate_abstracts(state.search.max_abstract_chars);
    }

    info!(count = response.count(), "PubMed search complete");
    Ok(Json(response))
}

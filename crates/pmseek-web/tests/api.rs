//! Router tests against an in-memory literature source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use pmseek_common::error::{PmseekError, Result};
use pmseek_literature::{ArticleRecord, LiteratureSource, SearchQuery, SortOrder};
use pmseek_web::config::SearchSettings;
use pmseek_web::router::build_router;
use pmseek_web::state::AppState;

#[derive(Default)]
struct FakeSource {
    ids: Vec<String>,
    records: Vec<ArticleRecord>,
    fail_lookup: bool,
    lookups: AtomicUsize,
    fetches: AtomicUsize,
    last_max_results: AtomicUsize,
    last_sort: Mutex<Option<SortOrder>>,
}

#[async_trait]
impl LiteratureSource for FakeSource {
    async fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.last_max_results.store(query.max_results, Ordering::SeqCst);
        *self.last_sort.lock().unwrap() = Some(query.sort);
        if self.fail_lookup {
            return Err(PmseekError::Upstream { service: "PubMed esearch", status: 500 });
        }
        Ok(self.ids.iter().take(query.max_results).cloned().collect())
    }

    async fn fetch_records(&self, ids: &[String]) -> Result<Vec<ArticleRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .iter()
            .filter(|r| ids.contains(&r.pmid))
            .cloned()
            .collect())
    }
}

fn record(pmid: &str, abstract_text: &str) -> ArticleRecord {
    ArticleRecord {
        pmid: pmid.to_string(),
        title: format!("Article {}", pmid),
        abstract_text: abstract_text.to_string(),
        journal: "Cell".to_string(),
        year: "2024".to_string(),
        authors: vec!["Zhang, Feng".to_string()],
        url: ArticleRecord::url_for(pmid),
        ..Default::default()
    }
}

fn source_with(ids: &[&str]) -> FakeSource {
    FakeSource {
        ids: ids.iter().map(|s| s.to_string()).collect(),
        records: ids.iter().map(|id| record(id, "Short abstract.")).collect(),
        ..Default::default()
    }
}

async fn call(source: Arc<FakeSource>, req: Request<Body>) -> (StatusCode, Value) {
    let app = build_router(AppState::new(source, SearchSettings::default()));
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(source: Arc<FakeSource>, uri: &str) -> (StatusCode, Value) {
    call(source, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(source: Arc<FakeSource>, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(source, req).await
}

#[tokio::test]
async fn test_healthz() {
    let (status, body) = get(Arc::new(FakeSource::default()), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_root_describes_service() {
    let (status, body) = get(Arc::new(FakeSource::default()), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "PubMed Search Tool");
    assert_eq!(body["status"], "ok");
    assert!(body["hint"].as_str().unwrap().contains("/openapi.json"));
}

#[tokio::test]
async fn test_openapi_lists_search_operation() {
    let (status, body) = get(Arc::new(FakeSource::default()), "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "PubMed Search Tool");
    let op = &body["paths"]["/search"]["get"];
    assert_eq!(op["operationId"], "pubmed_search_recent");
    assert_eq!(op["tags"], json!(["pubmed"]));
    let params: Vec<&str> = op["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(params, vec!["q", "max_results", "mindate", "maxdate"]);
    assert_eq!(body["paths"]["/healthz"]["get"]["operationId"], "healthz");
}

#[tokio::test]
async fn test_search_envelope() {
    let source = Arc::new(source_with(&["111", "222", "333"]));
    let (status, body) = get(source.clone(), "/search?q=CRISPR&max_results=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "CRISPR");
    assert_eq!(body["count"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["url"], "https://pubmed.ncbi.nlm.nih.gov/111/");
    assert_eq!(results[0]["abstract"], "Short abstract.");
    assert_eq!(results[0]["authors"], json!(["Zhang, Feng"]));
    assert_eq!(results[0]["doi"], "");
    assert_eq!(results[0]["mesh_terms"], json!([]));
    assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(*source.last_sort.lock().unwrap(), Some(SortOrder::PubDate));
}

#[tokio::test]
async fn test_count_matches_resolved_records() {
    // Lookup finds three ids but only two resolve on fetch.
    let mut source = source_with(&["111", "222", "333"]);
    source.records.remove(1);
    let (status, body) = get(Arc::new(source), "/search?q=CRISPR").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_default_and_clamped_max_results() {
    let source = Arc::new(FakeSource::default());
    get(source.clone(), "/search?q=x").await;
    assert_eq!(source.last_max_results.load(Ordering::SeqCst), 25);

    get(source.clone(), "/search?q=x&max_results=9999").await;
    assert_eq!(source.last_max_results.load(Ordering::SeqCst), 200);
}

#[tokio::test]
async fn test_empty_lookup_skips_fetch() {
    let source = Arc::new(FakeSource::default());
    let (status, body) = get(source.clone(), "/search?q=nothing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "query": "nothing", "count": 0, "results": [] }));
    assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_q_is_client_error_without_calls() {
    let source = Arc::new(source_with(&["111"]));
    let (status, body) = get(source.clone(), "/search").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("'q'"));
    assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_params_are_client_errors() {
    let source = Arc::new(source_with(&["111"]));
    for uri in [
        "/search?q=x&max_results=lots",
        "/search?q=x&mindate=01-01-2020",
        "/search?q=x&maxdate=2020/02/30",
    ] {
        let (status, body) = get(source.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
    assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lookup_failure_is_server_error() {
    let source = Arc::new(FakeSource { fail_lookup: true, ..source_with(&["111"]) });
    let (status, body) = get(source.clone(), "/search?q=CRISPR").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "PubMed esearch returned HTTP 500" }));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_long_abstracts_are_clipped() {
    let long = "x".repeat(1500);
    let short = "y".repeat(1200);
    let source = FakeSource {
        ids: vec!["1".into(), "2".into()],
        records: vec![record("1", &long), record("2", &short)],
        ..Default::default()
    };
    let (_, body) = get(Arc::new(source), "/search?q=x").await;

    assert_eq!(body["results"][0]["abstract"], format!("{}…", "x".repeat(1200)));
    assert_eq!(body["results"][1]["abstract"], short);
}

#[tokio::test]
async fn test_citation_surface() {
    let source = Arc::new(source_with(&["111", "222", "333", "444"]));
    let (status, body) = post_json(source.clone(), "/search-pubmed", r#"{"query": "CRISPR"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let text = body["formatted_results"].as_str().unwrap();
    assert_eq!(text.matches("---[START OF CITATION]---").count(), 3);
    assert!(text.contains("Source: [PMID: 111]\nTitle: Article 111\nAuthors: Zhang, Feng\nDate: 2024\n"));
    assert_eq!(source.last_max_results.load(Ordering::SeqCst), 3);
    assert_eq!(*source.last_sort.lock().unwrap(), Some(SortOrder::Relevance));
}

#[tokio::test]
async fn test_citation_prints_full_pub_date() {
    let mut source = source_with(&["111"]);
    source.records[0].pub_date = "2024 Mar 7".into();
    let (_, body) = post_json(Arc::new(source), "/search-pubmed", r#"{"query": "CRISPR"}"#).await;

    assert!(body["formatted_results"].as_str().unwrap().contains("Date: 2024 Mar 7\n"));
}

#[tokio::test]
async fn test_citation_no_results() {
    let (status, body) = post_json(Arc::new(FakeSource::default()), "/search-pubmed", r#"{"query": "zzz"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["formatted_results"], "No relevant articles found on PubMed.");
}

#[tokio::test]
async fn test_citation_missing_query() {
    let source = Arc::new(source_with(&["111"]));
    for payload in [r#"{}"#, r#"{"query": ""}"#, "not json"] {
        let (status, body) = post_json(source.clone(), "/search-pubmed", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body, json!({ "error": "Missing 'query' in request body" }));
    }
    assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
}

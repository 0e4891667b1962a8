//! PubMed E-utilities client.
//!
//! Endpoints used:
//!   esearch: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   efetch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi

use std::time::Duration;

use async_trait::async_trait;
use chrono::Datelike;
use pmseek_common::error::{PmseekError, Result};
use pmseek_common::sandbox::SandboxClient as Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use crate::models::{ArticleRecord, SearchQuery};
use super::pubmed_xml::parse_pubmed_xml;
use super::LiteratureSource;

pub const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
pub const EFETCH_URL:  &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Lower bound sent when only `maxdate` is given.
const EARLIEST_PUB_YEAR: &str = "1800";

/// Connection settings for [`PubMedClient`]. Fixed at construction.
#[derive(Debug)]
pub struct PubMedConfig {
    pub esearch_url: String,
    pub efetch_url: String,
    pub api_key: Option<SecretString>,
    /// NCBI asks callers to identify themselves with `tool` and `email`.
    pub tool: String,
    pub email: Option<String>,
    pub timeout: Duration,
    /// Pause before each call when an API key is set (10 req/s allowed).
    pub delay_with_key: Duration,
    /// Pause before each call without a key (3 req/s allowed).
    pub delay_without_key: Duration,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            esearch_url: ESEARCH_URL.to_string(),
            efetch_url: EFETCH_URL.to_string(),
            api_key: None,
            tool: "pmseek".to_string(),
            email: None,
            timeout: Duration::from_secs(30),
            delay_with_key: Duration::from_millis(110),
            delay_without_key: Duration::from_millis(340),
        }
    }
}

pub struct PubMedClient {
    client: Client,
    config: PubMedConfig,
}

impl PubMedClient {
    pub fn new(config: PubMedConfig) -> Result<Self> {
        let mut client = Client::new(config.timeout)?;
        client.allow_url(&config.esearch_url)?;
        client.allow_url(&config.efetch_url)?;
        Ok(Self { client, config })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Delay inserted before every outbound call.
    pub fn pacing_delay(&self) -> Duration {
        if self.has_api_key() {
            self.config.delay_with_key
        } else {
            self.config.delay_without_key
        }
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("tool", self.config.tool.clone()),
        ];
        if let Some(email) = &self.config.email {
            params.push(("email", email.clone()));
        }
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.expose_secret().to_string()));
        }
        params
    }

    async fn get(&self, service: &'static str, url: &str, params: &[(&'static str, String)]) -> Result<String> {
        tokio::time::sleep(self.pacing_delay()).await;

        let resp = self.client
            .get(url)?
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, service, "PubMed call failed");
            return Err(PmseekError::Upstream { service, status: status.as_u16() });
        }

        Ok(resp.text().await?)
    }
}

/// esearch query parameters for `query`, excluding the shared ones.
fn esearch_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("term", query.term.clone()),
        ("retmax", query.max_results.to_string()),
        ("retmode", "json".to_string()),
        ("sort", query.sort.as_param().to_string()),
    ];

    if query.has_date_window() {
        let mindate = query
            .mindate
            .map(|d| d.to_string())
            .unwrap_or_else(|| EARLIEST_PUB_YEAR.to_string());
        let maxdate = query
            .maxdate
            .map(|d| d.to_string())
            .unwrap_or_else(|| chrono::Utc::now().year().to_string());
        params.push(("datetype", "pdat".to_string()));
        params.push(("mindate", mindate));
        params.push(("maxdate", maxdate));
    }

    params
}

/// Reads `esearchresult.idlist`; an absent list is an empty result.
fn parse_idlist(body: &str) -> Result<Vec<String>> {
    let resp: serde_json::Value = serde_json::from_str(body)?;

    if let Some(err) = resp["esearchresult"]["ERROR"].as_str() {
        warn!(error = err, "PubMed esearch reported an error");
    }

    Ok(resp["esearchresult"]["idlist"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default())
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    /// Search PubMed and return PMIDs in the query's sort order.
    #[instrument(skip(self, query), fields(term = %query.term, max = query.max_results, sort = query.sort.as_param()))]
    async fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>> {
        let mut params = esearch_params(query);
        params.extend(self.base_params());

        let body = self.get("PubMed esearch", &self.config.esearch_url, &params).await?;
        let ids = parse_idlist(&body)?;

        debug!(?ids, "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    /// Fetch PubMed XML for a list of PMIDs and normalise it into records.
    #[instrument(skip(self, ids), fields(n = ids.len()))]
    async fn fetch_records(&self, ids: &[String]) -> Result<Vec<ArticleRecord>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut params = vec![
            ("id", ids.join(",")),
            ("rettype", "abstract".to_string()),
            ("retmode", "xml".to_string()),
        ];
        params.extend(self.base_params());

        let xml = self.get("PubMed efetch", &self.config.efetch_url, &params).await?;
        let records = parse_pubmed_xml(&xml)?;

        debug!(count = records.len(), "PubMed efetch returned records");
        Ok(records)
    }
}

//! Literature source clients.

pub mod pubmed;
pub mod pubmed_xml;

use async_trait::async_trait;
use pmseek_common::error::Result;

use crate::models::{ArticleRecord, SearchQuery};

/// The two-step lookup/fetch interface of a literature database.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Lookup step: ordered identifiers matching the query.
    async fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>>;

    /// Fetch step: one record per identifier the source could resolve.
    async fn fetch_records(&self, ids: &[String]) -> Result<Vec<ArticleRecord>>;

    /// Runs lookup then fetch. The fetch step is skipped when the lookup is empty.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ArticleRecord>> {
        let ids = self.search_ids(query).await?;
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.fetch_records(&ids).await
    }
}

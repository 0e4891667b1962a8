//! Shared application state for the web server.

use std::sync::Arc;

use pmseek_common::error::Result;
use pmseek_literature::{LiteratureSource, PubMedClient};

use crate::config::{Config, SearchSettings};

/// Shared state injected into every Axum handler. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn LiteratureSource>,
    pub search: SearchSettings,
}

impl AppState {
    pub fn new(source: Arc<dyn LiteratureSource>, search: SearchSettings) -> Self {
        Self { source, search }
    }

    /// State backed by the live PubMed client described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = PubMedClient::new(config.pubmed.client_config())?;
        Ok(Self::new(Arc::new(client), config.search.clone()))
    }
}

pub type SharedState = Arc<AppState>;

//! pmseek-literature — PubMed lookup, record normalisation and citation formatting.
//!
//! The pipeline is two steps:
//!   1. esearch: query → ordered PMIDs
//!   2. efetch:  PMIDs → `ArticleRecord`s

pub mod citation;
pub mod models;
pub mod sources;

pub use models::{ArticleRecord, DateBound, SearchQuery, SearchResponse, SortOrder};
pub use sources::pubmed::{PubMedClient, PubMedConfig};
pub use sources::LiteratureSource;

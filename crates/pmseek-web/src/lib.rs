//! pmseek-web — HTTP front end for PubMed search.
//! Provides:
//!   - `GET /search` structured JSON results
//!   - `POST /search-pubmed` plain-text citation blocks
//!   - `GET /healthz` and `GET /` liveness endpoints

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;

//! Data models for the search pipeline.

use chrono::NaiveDate;
use pmseek_common::error::{PmseekError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public landing page for a PMID.
pub const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

pub const DEFAULT_MAX_RESULTS: usize = 25;
pub const MAX_RESULTS_LIMIT: usize = 200;
/// Abstract budget in characters.
pub const MAX_ABS: usize = 1200;
pub const ELLIPSIS: char = '…';

/// One normalised PubMed article. Every field is best-effort and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ArticleRecord {
    pub pmid: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub journal: String,
    pub year: String,
    /// Display form of the journal issue date, e.g. "2019 Dec 5" or a
    /// MedlineDate range. Only the citation blocks print it.
    #[serde(skip)]
    pub pub_date: String,
    /// "Last, First" display names, in author-list order.
    pub authors: Vec<String>,
    pub doi: String,
    pub mesh_terms: Vec<String>,
    pub url: String,
}

impl ArticleRecord {
    /// Canonical PubMed URL for a PMID, or an empty string when there is none.
    pub fn url_for(pmid: &str) -> String {
        if pmid.is_empty() {
            String::new()
        } else {
            format!("{}/{}/", PUBMED_ARTICLE_URL, pmid)
        }
    }

    pub fn truncate_abstract(&mut self, max_chars: usize) {
        if let Some(clipped) = truncate_chars(&self.abstract_text, max_chars) {
            self.abstract_text = clipped;
        }
    }
}

/// Returns `text[..max_chars] + "…"` when `text` is longer than `max_chars`
/// characters, `None` when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> Option<String> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut clipped = String::with_capacity(cut + ELLIPSIS.len_utf8());
            clipped.push_str(&text[..cut]);
            clipped.push(ELLIPSIS);
            Some(clipped)
        }
        None => None,
    }
}

/// A publication date bound as accepted by esearch: `YYYY` or `YYYY/MM/DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Year(i32),
    Day(NaiveDate),
}

impl DateBound {
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim();
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            let year = s
                .parse()
                .map_err(|_| PmseekError::InvalidInput(format!("invalid year: {}", raw)))?;
            return Ok(DateBound::Year(year));
        }
        NaiveDate::parse_from_str(s, "%Y/%m/%d")
            .map(DateBound::Day)
            .map_err(|_| {
                PmseekError::InvalidInput(format!(
                    "invalid date {:?}: expected YYYY or YYYY/MM/DD",
                    raw
                ))
            })
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBound::Year(y) => write!(f, "{:04}", y),
            DateBound::Day(d)  => write!(f, "{}", d.format("%Y/%m/%d")),
        }
    }
}

/// Result ordering requested from esearch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest publications first.
    #[default]
    PubDate,
    /// PubMed's Best Match ranking.
    Relevance,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::PubDate   => "pub_date",
            SortOrder::Relevance => "relevance",
        }
    }
}

/// A validated lookup request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub term: String,
    pub max_results: usize,
    pub mindate: Option<DateBound>,
    pub maxdate: Option<DateBound>,
    pub sort: SortOrder,
}

impl SearchQuery {
    /// Builds a query with the default result limit. Blank terms are rejected.
    pub fn new(term: &str) -> Result<Self> {
        let term = term.trim();
        if term.is_empty() {
            return Err(PmseekError::InvalidInput("query parameter 'q' is required".into()));
        }
        Ok(Self {
            term: term.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            mindate: None,
            maxdate: None,
            sort: SortOrder::default(),
        })
    }

    /// Sets the result limit, clamped to `1..=limit`.
    pub fn with_max_results(mut self, requested: i64, limit: usize) -> Self {
        let limit = limit.max(1);
        self.max_results = requested.clamp(1, limit as i64) as usize;
        self
    }

    pub fn with_date_window(mut self, mindate: Option<DateBound>, maxdate: Option<DateBound>) -> Self {
        self.mindate = mindate;
        self.maxdate = maxdate;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn has_date_window(&self) -> bool {
        self.mindate.is_some() || self.maxdate.is_some()
    }
}

/// Response envelope for `GET /search`.
///
/// `count` is derived from `results` when the envelope is built and cannot be
/// set on its own.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SearchResponse {
    query: String,
    count: usize,
    results: Vec<ArticleRecord>,
}

impl SearchResponse {
    pub fn new(query: impl Into<String>, results: Vec<ArticleRecord>) -> Self {
        Self {
            query: query.into(),
            count: results.len(),
            results,
        }
    }

    /// Clips every abstract to `max_chars` characters.
    pub fn truncate_abstracts(mut self, max_chars: usize) -> Self {
        for record in &mut self.results {
            record.truncate_abstract(max_chars);
        }
        self
    }

    pub fn query(&self) -> &str { &self.query }
    pub fn count(&self) -> usize { self.count }
    pub fn results(&self) -> &[ArticleRecord] { &self.results }
}

//! Plain-text citation blocks for LLM tool callers.
//!
//! Each record is wrapped in explicit start/end markers together with its
//! PMID so downstream prompts can quote sources verbatim.

use crate::models::ArticleRecord;

/// Result limit used by the citation surface.
pub const CITATION_MAX_RESULTS: i64 = 3;
pub const NO_RESULTS: &str = "No relevant articles found on PubMed.";

const NO_TITLE: &str = "No title available.";
const NO_DATE: &str = "No date available.";

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

/// Full issue date when the record carries one, else the year.
fn citation_date(record: &ArticleRecord) -> &str {
    if record.pub_date.is_empty() { &record.year } else { &record.pub_date }
}

pub fn format_citation(record: &ArticleRecord) -> String {
    format!(
        "---[START OF CITATION]---\n\
         Source: [PMID: {}]\n\
         Title: {}\n\
         Authors: {}\n\
         Date: {}\n\
         ---[END OF CITATION]---\n\n",
        record.pmid,
        or_placeholder(&record.title, NO_TITLE),
        record.authors.join(", "),
        or_placeholder(citation_date(record), NO_DATE),
    )
}

/// Concatenated citation blocks, or [`NO_RESULTS`] when there are none.
pub fn format_citations(records: &[ArticleRecord]) -> String {
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }
    records.iter().map(format_citation).collect()
}

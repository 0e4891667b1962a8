//! Normalisation of efetch XML (`<PubmedArticleSet>`) into flat `ArticleRecord`s.
//!
//! Extraction is best-effort: a field that is absent stays empty. Only a
//! document that is not well-formed, or whose root is not
//! `PubmedArticleSet`, is an error.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use pmseek_common::error::{PmseekError, Result};
use tracing::debug;

use crate::models::ArticleRecord;

/// Which field the text under the current element belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Capture {
    Pmid,
    Title,
    Abstract,
    Journal,
    Year,
    Month,
    Day,
    MedlineDate,
    LastName,
    ForeName,
    ArticleIdDoi,
    ELocationDoi,
    Mesh,
}

/// Accumulates one `<PubmedArticle>`.
#[derive(Debug, Default)]
struct ArticleBuilder {
    pmid: String,
    title: String,
    abstract_segments: Vec<String>,
    journal: String,
    year: String,
    month: String,
    day: String,
    medline_date: String,
    authors: Vec<String>,
    last_name: String,
    fore_name: String,
    article_id_doi: String,
    elocation_doi: String,
    mesh_terms: Vec<String>,
    /// Active capture and the stack depth of the element that opened it.
    capture: Option<(Capture, usize)>,
    text: String,
}

fn has_doi_attr(e: &BytesStart<'_>, key: &str) -> bool {
    matches!(
        e.try_get_attribute(key),
        Ok(Some(attr)) if attr.value.as_ref().eq_ignore_ascii_case(b"doi")
    )
}

fn parent_is(path: &[Vec<u8>], name: &[u8]) -> bool {
    path.last().map(|p| p.as_slice() == name).unwrap_or(false)
}

fn grandparent_is(path: &[Vec<u8>], name: &[u8]) -> bool {
    path.len() >= 2 && path[path.len() - 2].as_slice() == name
}

impl ArticleBuilder {
    /// Called for each start tag inside the article; `path` excludes `e` itself.
    fn open(&mut self, path: &[Vec<u8>], e: &BytesStart<'_>) {
        // Inline markup (<i>, <sup>, ...) inside a captured field keeps the capture.
        if self.capture.is_some() {
            return;
        }

        let capture = match e.name().as_ref() {
            b"PMID" if parent_is(path, b"MedlineCitation") && self.pmid.is_empty() => Capture::Pmid,
            b"ArticleTitle" if parent_is(path, b"Article") => Capture::Title,
            b"AbstractText" if parent_is(path, b"Abstract") => Capture::Abstract,
            b"Title" if parent_is(path, b"Journal") => Capture::Journal,
            b"Year" if parent_is(path, b"PubDate") => Capture::Year,
            b"Month" if parent_is(path, b"PubDate") => Capture::Month,
            b"Day" if parent_is(path, b"PubDate") => Capture::Day,
            b"MedlineDate" if parent_is(path, b"PubDate") => Capture::MedlineDate,
            b"Author" if parent_is(path, b"AuthorList") => {
                self.last_name.clear();
                self.fore_name.clear();
                return;
            }
            b"LastName" if parent_is(path, b"Author") && grandparent_is(path, b"AuthorList") => Capture::LastName,
            b"ForeName" if parent_is(path, b"Author") && grandparent_is(path, b"AuthorList") => Capture::ForeName,
            b"ArticleId"
                if parent_is(path, b"ArticleIdList")
                    && grandparent_is(path, b"PubmedData")
                    && has_doi_attr(e, "IdType") => Capture::ArticleIdDoi,
            b"ELocationID" if parent_is(path, b"Article") && has_doi_attr(e, "EIdType") => Capture::ELocationDoi,
            b"DescriptorName" if parent_is(path, b"MeshHeading") => Capture::Mesh,
            _ => return,
        };

        self.text.clear();
        self.capture = Some((capture, path.len()));
    }

    fn push_text(&mut self, text: &str) {
        if self.capture.is_some() {
            self.text.push_str(text);
        }
    }

    /// Called for each end tag inside the article; `path` excludes the closed element.
    fn close(&mut self, path: &[Vec<u8>], name: &[u8]) {
        if name == b"Author" && parent_is(path, b"AuthorList") {
            let last = self.last_name.trim();
            let fore = self.fore_name.trim();
            let display = match (last.is_empty(), fore.is_empty()) {
                (false, false) => format!("{}, {}", last, fore),
                (false, true)  => last.to_string(),
                (true, false)  => fore.to_string(),
                (true, true)   => return,
            };
            self.authors.push(display);
            return;
        }

        let capture = match self.capture {
            Some((capture, depth)) if depth == path.len() => capture,
            _ => return,
        };
        self.capture = None;

        let value = self.text.trim().to_string();
        match capture {
            Capture::Pmid        => self.pmid = value,
            Capture::Title       => self.title = value,
            Capture::Abstract    => {
                if !value.is_empty() {
                    self.abstract_segments.push(value);
                }
            }
            Capture::Journal     => self.journal = value,
            Capture::Year        => self.year = value,
            Capture::Month       => self.month = value,
            Capture::Day         => self.day = value,
            Capture::MedlineDate => self.medline_date = value,
            Capture::LastName    => self.last_name = value,
            Capture::ForeName    => self.fore_name = value,
            Capture::ArticleIdDoi => {
                if self.article_id_doi.is_empty() {
                    self.article_id_doi = value;
                }
            }
            Capture::ELocationDoi => {
                if self.elocation_doi.is_empty() {
                    self.elocation_doi = value;
                }
            }
            Capture::Mesh => {
                if !value.is_empty() && !self.mesh_terms.contains(&value) {
                    self.mesh_terms.push(value);
                }
            }
        }
    }

    fn finish(self) -> ArticleRecord {
        let pub_date = if !self.medline_date.is_empty() {
            self.medline_date.clone()
        } else {
            display_pub_date(&self.year, &self.month, &self.day)
        };

        let year = if !self.year.is_empty() {
            self.year
        } else {
            // MedlineDate looks like "1998 Dec-1999 Jan"
            self.medline_date
                .get(..4)
                .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
                .map(String::from)
                .unwrap_or_default()
        };

        let doi = if !self.article_id_doi.is_empty() {
            self.article_id_doi
        } else {
            self.elocation_doi
        };

        ArticleRecord {
            url: ArticleRecord::url_for(&self.pmid),
            pmid: self.pmid,
            title: self.title,
            abstract_text: self.abstract_segments.join(" "),
            journal: self.journal,
            year,
            pub_date,
            authors: self.authors,
            doi,
            mesh_terms: self.mesh_terms,
        }
    }
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// "2019 Dec 5" from PubDate parts. Numeric months become abbreviations and
/// leading zeros are dropped from the day.
fn display_pub_date(year: &str, month: &str, day: &str) -> String {
    if year.is_empty() {
        return String::new();
    }
    let month = match month.parse::<usize>() {
        Ok(n) if (1..=12).contains(&n) => MONTHS[n - 1].to_string(),
        _ => month.to_string(),
    };
    let day = day
        .parse::<u32>()
        .map(|d| d.to_string())
        .unwrap_or_else(|_| day.to_string());

    let mut out = year.to_string();
    for part in [month, day] {
        if part.is_empty() {
            break;
        }
        out.push(' ');
        out.push_str(&part);
    }
    out
}

fn xml_error<E: std::fmt::Display>(reader: &Reader<&[u8]>, e: E) -> PmseekError {
    PmseekError::Xml(format!("at byte {}: {}", reader.buffer_position(), e))
}

/// Parse PubMed XML (efetch abstract mode) into one record per `<PubmedArticle>`,
/// in document order.
pub fn parse_pubmed_xml(xml: &str) -> Result<Vec<ArticleRecord>> {
    let mut records = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<ArticleBuilder> = None;
    let mut seen_root = false;
    let mut skipped_books = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name().as_ref().to_vec();
                if path.is_empty() {
                    check_root(&reader, &name)?;
                    seen_root = true;
                }
                if name == b"PubmedArticle" {
                    current = Some(ArticleBuilder::default());
                } else if name == b"PubmedBookArticle" {
                    skipped_books += 1;
                } else if let Some(ref mut article) = current {
                    article.open(&path, e);
                }
                path.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                if path.is_empty() {
                    check_root(&reader, e.name().as_ref())?;
                    seen_root = true;
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(ref mut article) = current {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                    article.push_text(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(ref mut article) = current {
                    article.push_text(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                path.pop();
                let name = e.name();
                if name.as_ref() == b"PubmedArticle" {
                    if let Some(article) = current.take() {
                        records.push(article.finish());
                    }
                } else if let Some(ref mut article) = current {
                    article.close(&path, name.as_ref());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = path.last() {
        return Err(xml_error(
            &reader,
            format!("unexpected end of document inside <{}>", String::from_utf8_lossy(open)),
        ));
    }
    if !seen_root {
        return Err(PmseekError::Xml("document has no root element".into()));
    }

    if skipped_books > 0 {
        debug!(skipped = skipped_books, "Skipped PubmedBookArticle entries");
    }
    debug!(count = records.len(), "Parsed PubMed articles");
    Ok(records)
}

fn check_root(reader: &Reader<&[u8]>, name: &[u8]) -> Result<()> {
    if name == b"PubmedArticleSet" {
        Ok(())
    } else {
        Err(xml_error(
            reader,
            format!("unexpected root element <{}>", String::from_utf8_lossy(name)),
        ))
    }
}

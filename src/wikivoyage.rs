//! Wikivoyage integration for "See"/"Eat" excerpts
//!
//! Excerpts come from three dependent MediaWiki API calls: an `opensearch`
//! title lookup, a `parse` call listing the page's sections, and one `parse`
//! call per wanted section returning its rendered HTML.

use crate::config::LookupConfig;
use crate::extract::ExcerptExtractor;
use crate::WikiExtract;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Wikivoyage-specific error types
#[derive(Error, Debug)]
pub enum WikivoyageError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{step} failed with status: {status}")]
    StatusError { step: &'static str, status: u16 },

    #[error("Parsing failed: {0}")]
    ParseError(String),
}

/// One entry of a page's section index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    /// Heading text, e.g. "See"
    #[serde(rename = "line")]
    pub label: String,
    /// Index used to request the section's content
    pub index: String,
}

/// Progress of one excerpt lookup
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ExcerptStage {
    #[default]
    Idle,
    Searching,
    IndexLookup { title: String },
    ContentFetch { label: String },
    Done,
    /// No matching page
    Empty,
    /// Transport or parse failure, shown the same as `Empty`
    Failed,
}

impl ExcerptStage {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ExcerptStage::Searching | ExcerptStage::IndexLookup { .. } | ExcerptStage::ContentFetch { .. }
        )
    }
}

/// The three remote steps behind an excerpt lookup
#[async_trait]
pub trait TravelWiki: Send + Sync {
    /// Best-matching page title for free text, if any
    async fn search_title(&self, query: &str) -> Result<Option<String>, WikivoyageError>;

    /// Every section heading of a page, in page order
    async fn section_index(&self, title: &str) -> Result<Vec<SectionRef>, WikivoyageError>;

    /// Rendered HTML of one section
    async fn section_html(&self, title: &str, index: &str) -> Result<String, WikivoyageError>;
}

#[derive(Debug, Deserialize)]
struct ParseEnvelope<T> {
    parse: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ParsedSections {
    #[serde(default)]
    sections: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    line: Option<String>,
    index: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ParsedText {
    text: Option<HashMap<String, String>>,
}

/// Wikivoyage MediaWiki API client
pub struct WikivoyageClient {
    client: reqwest::Client,
    api_url: String,
}

impl WikivoyageClient {
    /// Create a new Wikivoyage client
    pub fn new(config: &LookupConfig) -> Result<Self, WikivoyageError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            api_url: config.endpoints.wikivoyage.clone(),
        })
    }

    /// Execute a GET against the API endpoint and decode the JSON body
    async fn execute_api_query(
        &self,
        step: &'static str,
        params: &[(&str, &str)],
    ) -> Result<Value, WikivoyageError> {
        let start_time = std::time::Instant::now();
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await?;
        let status = response.status();

        debug!(
            step,
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Wikivoyage request completed"
        );

        if !status.is_success() {
            return Err(WikivoyageError::StatusError {
                step,
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TravelWiki for WikivoyageClient {
    async fn search_title(&self, query: &str) -> Result<Option<String>, WikivoyageError> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        let body = self
            .execute_api_query(
                "title search",
                &[
                    ("action", "opensearch"),
                    ("search", query),
                    ("limit", "1"),
                    ("namespace", "0"),
                ],
            )
            .await?;
        Ok(parse_opensearch_title(&body))
    }

    async fn section_index(&self, title: &str) -> Result<Vec<SectionRef>, WikivoyageError> {
        let body = self
            .execute_api_query(
                "section index",
                &[("action", "parse"), ("page", title), ("prop", "sections")],
            )
            .await?;
        parse_section_index(body)
    }

    async fn section_html(&self, title: &str, index: &str) -> Result<String, WikivoyageError> {
        let body = self
            .execute_api_query(
                "section content",
                &[
                    ("action", "parse"),
                    ("page", title),
                    ("section", index),
                    ("prop", "text"),
                ],
            )
            .await?;
        parse_section_html(body)
    }
}

/// `opensearch` answers `[query, [titles], [descriptions], [urls]]`
fn parse_opensearch_title(body: &Value) -> Option<String> {
    body.get(1)?
        .get(0)?
        .as_str()
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}

fn parse_section_index(body: Value) -> Result<Vec<SectionRef>, WikivoyageError> {
    let envelope: ParseEnvelope<ParsedSections> = serde_json::from_value(body)?;
    let sections = envelope.parse.map(|p| p.sections).unwrap_or_default();

    Ok(sections
        .into_iter()
        .filter_map(|raw| {
            let index = match raw.index? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(SectionRef {
                label: raw.line?,
                index,
            })
        })
        .collect())
}

fn parse_section_html(body: Value) -> Result<String, WikivoyageError> {
    let envelope: ParseEnvelope<ParsedText> = serde_json::from_value(body)?;
    Ok(envelope
        .parse
        .and_then(|p| p.text)
        .and_then(|mut text| text.remove("*"))
        .unwrap_or_default())
}

/// Pick the sections named in `labels`, keeping the order of `labels`.
/// Heading comparison ignores case; the requested spelling is kept.
pub fn match_sections(index: &[SectionRef], labels: &[String]) -> Vec<(String, String)> {
    labels
        .iter()
        .filter_map(|label| {
            index
                .iter()
                .find(|s| s.label.to_lowercase() == label.to_lowercase())
                .filter(|s| !s.index.is_empty())
                .map(|s| (label.clone(), s.index.clone()))
        })
        .collect()
}

/// Search → section index → section content, reporting each step to `observe`.
///
/// `observe` returning `false` means the caller has moved on: the lookup stops
/// before the next request and yields `Ok(None)`.
pub async fn fetch_travel_excerpts_observed<F>(
    wiki: &dyn TravelWiki,
    extractor: &dyn ExcerptExtractor,
    name: &str,
    labels: &[String],
    limit: usize,
    mut observe: F,
) -> Result<Option<WikiExtract>, WikivoyageError>
where
    F: FnMut(&ExcerptStage) -> bool + Send,
{
    if !observe(&ExcerptStage::Searching) {
        return Ok(None);
    }
    let Some(title) = wiki.search_title(name).await? else {
        debug!(name, "No Wikivoyage page found");
        return Ok(Some(WikiExtract::default()));
    };

    if !observe(&ExcerptStage::IndexLookup {
        title: title.clone(),
    }) {
        return Ok(None);
    }
    let index = wiki.section_index(&title).await?;
    let wanted = match_sections(&index, labels);
    debug!(title = %title, found = wanted.len(), requested = labels.len(), "Resolved section index");

    let mut extract = WikiExtract {
        page_title: Some(title.clone()),
        sections: Default::default(),
    };
    for (label, section) in wanted {
        if !observe(&ExcerptStage::ContentFetch {
            label: label.clone(),
        }) {
            return Ok(None);
        }
        let html = wiki.section_html(&title, &section).await?;
        extract.sections.insert(label, extractor.extract(&html, limit));
    }

    Ok(Some(extract))
}

/// Fetch excerpts for `name` from the sections named in `labels`.
///
/// A destination with no matching page yields an empty extract rather than
/// an error; sections the page does not have are left out.
#[instrument(level = "info", skip(wiki, extractor))]
pub async fn fetch_travel_excerpts(
    wiki: &dyn TravelWiki,
    extractor: &dyn ExcerptExtractor,
    name: &str,
    labels: &[String],
    limit: usize,
) -> Result<WikiExtract, WikivoyageError> {
    let extract = fetch_travel_excerpts_observed(wiki, extractor, name, labels, limit, |_| true)
        .await?
        .unwrap_or_default();
    info!(
        page = extract.page_title.as_deref().unwrap_or(""),
        sections = extract.sections.len(),
        "Wikivoyage excerpts fetched"
    );
    Ok(extract)
}

//! Record types shared across jobfeed

use crate::error::{JobfeedError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field of a search response that holds the job entries.
pub const ENTRIES_FIELD: &str = "data";

/// One upstream search response, kept as the untouched JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPage(pub Value);

impl RawPage {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    /// Job entries of this page.
    ///
    /// Fails with [`JobfeedError::MalformedPage`] when the body is not an
    /// object or the entry field is missing or not an array.
    pub fn entries(&self) -> Result<&[Value]> {
        let body = self
            .0
            .as_object()
            .ok_or_else(|| JobfeedError::MalformedPage("response body is not an object".into()))?;

        match body.get(ENTRIES_FIELD) {
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => Err(JobfeedError::MalformedPage(format!(
                "'{}' is not an array",
                ENTRIES_FIELD
            ))),
            None => Err(JobfeedError::MalformedPage(format!(
                "missing '{}' field",
                ENTRIES_FIELD
            ))),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Either one page or a batch of pages.
///
/// Deserializes from a JSON array (batch) or any other JSON value (single
/// page), so a raw log written by either fetch mode reads back the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPayload {
    Batch(Vec<RawPage>),
    Single(RawPage),
}

impl RawPayload {
    pub fn pages(&self) -> &[RawPage] {
        match self {
            RawPayload::Batch(pages) => pages,
            RawPayload::Single(page) => std::slice::from_ref(page),
        }
    }

    pub fn into_pages(self) -> Vec<RawPage> {
        match self {
            RawPayload::Batch(pages) => pages,
            RawPayload::Single(page) => vec![page],
        }
    }
}

impl From<RawPage> for RawPayload {
    fn from(page: RawPage) -> Self {
        RawPayload::Single(page)
    }
}

impl From<Vec<RawPage>> for RawPayload {
    fn from(pages: Vec<RawPage>) -> Self {
        RawPayload::Batch(pages)
    }
}

/// Canonical flat job record. `id` is the upstream job identifier and the
/// deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(rename = "type", default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub apply_link: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
}

impl NormalizedJob {
    /// Create a record with only an id; every other field is empty.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            company: None,
            website: None,
            location: None,
            city: None,
            state: None,
            country: None,
            employment_type: None,
            apply_link: None,
            description: String::new(),
            posted_at: None,
            publisher: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

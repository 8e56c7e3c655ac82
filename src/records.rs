//! Typed views over raw search records.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::context::{SearchContext, SearchType};
use crate::error::{Error, Result};
use crate::query::Constraints;

/// Service name -> `(url, mime_type)` pairs, in record order.
pub type UrlMap = BTreeMap<String, Vec<(String, String)>>;

pub const SERVICE_OPENDAP: &str = "OPENDAP";
pub const SERVICE_HTTP: &str = "HTTPServer";

/// Accessors shared by every record type.
pub trait Record {
    /// The record as returned by the service.
    fn json(&self) -> &Value;

    /// The context whose search produced this record.
    fn context(&self) -> &SearchContext;

    fn field(&self, name: &str) -> Option<&Value> {
        self.json().get(name)
    }

    /// Decodes the `url` field, whose entries look like `<url>|<mime>|<service>`.
    fn urls(&self) -> UrlMap {
        let mut map = UrlMap::new();
        let Some(entries) = self.field("url").and_then(Value::as_array) else {
            return map;
        };

        for entry in entries {
            match entry.as_str().and_then(split_url_entry) {
                Some((url, mime, service)) => map
                    .entry(service.to_string())
                    .or_default()
                    .push((url.to_string(), mime.to_string())),
                None => warn!(entry = %entry, "Skipping malformed url entry"),
            }
        }
        map
    }

    /// First OPENDAP endpoint, without the `.html` suffix of its form page.
    fn opendap_url(&self) -> Option<String> {
        let url = first_url(&self.urls(), SERVICE_OPENDAP)?;
        Some(url.strip_suffix(".html").map(str::to_string).unwrap_or(url))
    }

    /// First plain HTTP download URL.
    fn download_url(&self) -> Option<String> {
        first_url(&self.urls(), SERVICE_HTTP)
    }
}

// Split from the right: the URL itself may contain '|'.
fn split_url_entry(entry: &str) -> Option<(&str, &str, &str)> {
    let mut parts = entry.rsplitn(3, '|');
    let service = parts.next()?;
    let mime = parts.next()?;
    let url = parts.next()?;
    Some((url, mime, service))
}

fn first_url(urls: &UrlMap, service: &str) -> Option<String> {
    urls.get(service)
        .and_then(|v| v.first())
        .map(|(url, _)| url.clone())
}

fn str_field<'a>(json: &'a Value, name: &str) -> Result<&'a str> {
    json.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::missing(name))
}

// Solr returns multi-valued fields as arrays; accept a bare string too.
fn first_str<'a>(json: &'a Value, name: &str) -> Result<&'a str> {
    let value = match json.get(name) {
        Some(Value::Array(items)) => items.first().and_then(Value::as_str),
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    };
    value.ok_or_else(|| Error::missing(name))
}

macro_rules! impl_record {
    ($ty:ty) => {
        impl Record for $ty {
            fn json(&self) -> &Value {
                &self.json
            }

            fn context(&self) -> &SearchContext {
                &self.context
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct DatasetResult {
    json: Value,
    context: SearchContext,
}

impl_record!(DatasetResult);

impl DatasetResult {
    pub fn new(json: Value, context: SearchContext) -> Self {
        Self { json, context }
    }

    /// Solr id of the dataset, unique across the federation.
    pub fn dataset_id(&self) -> Result<&str> {
        str_field(&self.json, "id")
    }

    /// A context searching the files of this dataset.
    pub fn file_context(&self) -> Result<SearchContext> {
        self.scoped_context(SearchType::File)
    }

    /// A context searching the aggregations of this dataset.
    pub fn aggregation_context(&self) -> Result<SearchContext> {
        self.scoped_context(SearchType::Aggregation)
    }

    fn scoped_context(&self, search_type: SearchType) -> Result<SearchContext> {
        SearchContext::new(
            self.context.connection().clone(),
            Constraints::new().add("dataset_id", self.dataset_id()?),
            search_type,
        )
    }
}

#[derive(Debug, Clone)]
pub struct FileResult {
    json: Value,
    context: SearchContext,
}

impl_record!(FileResult);

impl FileResult {
    pub fn new(json: Value, context: SearchContext) -> Self {
        Self { json, context }
    }

    pub fn file_id(&self) -> Result<&str> {
        str_field(&self.json, "id")
    }

    pub fn checksum(&self) -> Result<&str> {
        first_str(&self.json, "checksum")
    }

    /// Algorithm of [`FileResult::checksum`], e.g. `MD5` or `SHA256`.
    pub fn checksum_type(&self) -> Result<&str> {
        first_str(&self.json, "checksum_type")
    }

    pub fn filename(&self) -> Result<&str> {
        str_field(&self.json, "title")
    }

    /// Size in bytes. Indexes report it either as a number or as a string.
    pub fn size(&self) -> Result<u64> {
        let size = match self.json.get("size") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        size.ok_or_else(|| Error::missing("size"))
    }

    pub fn url(&self) -> Option<String> {
        self.download_url()
    }
}

#[derive(Debug, Clone)]
pub struct AggregationResult {
    json: Value,
    context: SearchContext,
}

impl_record!(AggregationResult);

impl AggregationResult {
    pub fn new(json: Value, context: SearchContext) -> Self {
        Self { json, context }
    }

    pub fn aggregation_id(&self) -> Result<&str> {
        str_field(&self.json, "id")
    }
}

/// A record of any search type.
#[derive(Debug, Clone)]
pub enum SearchResult {
    Dataset(DatasetResult),
    File(FileResult),
    Aggregation(AggregationResult),
}

impl SearchResult {
    /// Wraps `json` in the variant matching the context's search type.
    pub fn from_json(json: Value, context: SearchContext) -> Self {
        match context.search_type() {
            SearchType::Dataset => SearchResult::Dataset(DatasetResult::new(json, context)),
            SearchType::File => SearchResult::File(FileResult::new(json, context)),
            SearchType::Aggregation => {
                SearchResult::Aggregation(AggregationResult::new(json, context))
            }
        }
    }

    pub fn as_dataset(&self) -> Option<&DatasetResult> {
        match self {
            SearchResult::Dataset(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileResult> {
        match self {
            SearchResult::File(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_aggregation(&self) -> Option<&AggregationResult> {
        match self {
            SearchResult::Aggregation(r) => Some(r),
            _ => None,
        }
    }

    /// The record's `id`, whatever its type.
    pub fn id(&self) -> Result<&str> {
        str_field(self.json(), "id")
    }
}

impl Record for SearchResult {
    fn json(&self) -> &Value {
        match self {
            SearchResult::Dataset(r) => r.json(),
            SearchResult::File(r) => r.json(),
            SearchResult::Aggregation(r) => r.json(),
        }
    }

    fn context(&self) -> &SearchContext {
        match self {
            SearchResult::Dataset(r) => r.context(),
            SearchResult::File(r) => r.context(),
            SearchResult::Aggregation(r) => r.context(),
        }
    }
}

#![allow(dead_code)]

use esgf_search::{Error, HttpReply, Result, SearchConnection, Transport};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use url::Url;

pub const SERVICE: &str = "http://esgf.test/esg-search/search";

/// In-memory search index serving `total` records of whatever type is asked for.
#[derive(Debug, Default)]
pub struct FakeIndex {
    pub total: usize,
    requests: RefCell<Vec<Url>>,
    fail_offset: Cell<Option<usize>>,
    reply_override: RefCell<Option<Result<HttpReply>>>,
}

impl FakeIndex {
    pub fn new(total: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            ..Self::default()
        })
    }

    pub fn connection(self: &Arc<Self>) -> SearchConnection {
        SearchConnection::new(SERVICE)
            .unwrap()
            .with_transport(Arc::clone(self) as Arc<dyn Transport>)
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Requests that fetched records (limit > 0).
    pub fn batch_requests(&self) -> Vec<Url> {
        self.requests()
            .into_iter()
            .filter(|u| param(u, "limit").is_some_and(|l| l != "0"))
            .collect()
    }

    /// The next batch request at `offset` fails with HTTP 503.
    pub fn fail_once_at(&self, offset: usize) {
        self.fail_offset.set(Some(offset));
    }

    /// The next request gets `reply` instead of a generated one.
    pub fn reply_once(&self, reply: Result<HttpReply>) {
        *self.reply_override.borrow_mut() = Some(reply);
    }

    fn doc(search_type: &str, i: usize) -> Value {
        match search_type {
            "File" => json!({
                "id": format!("file.{}|node", i),
                "title": format!("tas_{}.nc", i),
                "size": format!("{}", 1000 + i),
                "checksum": [format!("sum{}", i)],
                "checksum_type": ["SHA256"],
                "url": [
                    format!("http://data.test/files/tas_{}.nc|application/netcdf|HTTPServer", i),
                    format!("http://data.test/dodsC/tas_{}.nc.html|application/opendap-html|OPENDAP", i),
                ],
            }),
            "Aggregation" => json!({
                "id": format!("agg.{}|node", i),
                "url": [format!("http://las.test/{}.aggregation|application/las|LAS", i)],
            }),
            _ => json!({
                "id": format!("ds.{}|node", i),
                "url": [format!("http://data.test/catalog/ds.{}.xml|application/xml+thredds|THREDDS", i)],
            }),
        }
    }
}

pub fn param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn params(url: &Url, key: &str) -> Vec<String> {
    url.query_pairs()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .collect()
}

impl Transport for FakeIndex {
    fn get(&self, url: &Url) -> Result<HttpReply> {
        self.requests.borrow_mut().push(url.clone());

        if let Some(reply) = self.reply_override.borrow_mut().take() {
            return reply;
        }

        let limit: usize = param(url, "limit").map_or(10, |l| l.parse().unwrap());
        let offset: usize = param(url, "offset").map_or(0, |o| o.parse().unwrap());

        if limit > 0 && self.fail_offset.get() == Some(offset) {
            self.fail_offset.set(None);
            return Ok(HttpReply {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }

        let search_type = param(url, "type").unwrap_or_else(|| "Dataset".to_string());
        let end = (offset + limit).min(self.total);
        let docs: Vec<Value> = (offset.min(end)..end)
            .map(|i| Self::doc(&search_type, i))
            .collect();

        let body = json!({
            "responseHeader": {
                "status": 0,
                "params": {"shards": "node-a:8983/solr,node-b:8983/solr"}
            },
            "response": {"numFound": self.total, "start": offset, "docs": docs},
            "facet_counts": {"facet_fields": {
                "project": ["CMIP5", self.total, "CORDEX", 0],
                "variable": ["tas", 3, "pr", 1]
            }}
        });

        Ok(HttpReply {
            status: 200,
            body: body.to_string(),
        })
    }
}

pub fn timeout_error() -> Error {
    Error::Timeout {
        url: SERVICE.to_string(),
    }
}

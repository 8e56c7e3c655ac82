use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::fmt::Debug;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Raw reply to a GET request.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single blocking HTTP GET.
///
/// Implementations report transport failures as [`Error::Connection`] or
/// [`Error::Timeout`]. Any HTTP status, including errors, is returned as a reply.
pub trait Transport: Debug {
    fn get(&self, url: &Url) -> Result<HttpReply>;
}

/// [`Transport`] backed by `reqwest::blocking`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(timeout: Duration, verify: bool) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("esgf-search-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("esgf-search-rs")),
        );
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(timeout);

        if !verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<HttpReply> {
        let resp = self.http.get(url.clone()).send().map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    url: url.to_string(),
                }
            } else {
                Error::Connection {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    url: url.to_string(),
                }
            } else {
                Error::Connection {
                    url: url.to_string(),
                    message: format!("failed to read response body: {}", e),
                }
            }
        })?;

        Ok(HttpReply { status, body })
    }
}

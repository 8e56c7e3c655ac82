//! A small Rust client for the ESGF Search API.
//!
//! The ESGF Search API indexes climate datasets, files and aggregations
//! published across the Earth System Grid Federation. This crate builds faceted
//! queries, sends them as HTTP GET requests and exposes the matching records as
//! one lazily paged sequence.
//!
//! ## Quick start
//! - Point a [`SearchConnection`] at a search endpoint, either directly or through
//!   `ESGF_SEARCH_URL` / a `.esgfsearchrc` file.
//! - Create a [`SearchContext`] with facet constraints and call
//!   [`SearchContext::search`].
//!
//! ```no_run
//! use esgf_search::{Constraints, Record, SearchConnection};
//!
//! fn main() -> esgf_search::Result<()> {
//!     let conn = SearchConnection::new("https://esgf-node.llnl.gov/esg-search/search")?
//!         .with_distrib(false);
//!     let ctx = conn.new_context(Constraints::new().add("project", "CMIP5"))?;
//!     let results = ctx.search()?;
//!     println!("{} datasets", results.len());
//!
//!     let first = results.get(0)?;
//!     if let Some(dataset) = first.as_dataset() {
//!         let files = dataset.file_context()?.search()?;
//!         for file in files.iter().take(5) {
//!             println!("{:?}", file?.download_url());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For configuration details, see the crate README.

#![forbid(unsafe_code)]

mod config;
mod connection;
mod context;
mod error;
mod query;
mod records;
mod response;
mod results;
mod transport;

pub use connection::{
    ConnectionConfig, ContextFactory, DEFAULT_TIMEOUT, Distribution, RESPONSE_FORMAT,
    SearchConnection,
};
pub use context::{SearchContext, SearchType};
pub use error::{Error, ErrorKind, Result};
pub use query::{Constraints, KeywordType, QueryParams, query_keyword_type};
pub use records::{
    AggregationResult, DatasetResult, FileResult, Record, SERVICE_HTTP, SERVICE_OPENDAP,
    SearchResult, UrlMap,
};
pub use response::FacetCounts;
pub use results::{DEFAULT_BATCH_SIZE, Iter, ResultBuilder, ResultSet};
pub use transport::{HttpReply, HttpTransport, Transport};

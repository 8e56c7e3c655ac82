use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::load_config;
use crate::context::{SearchContext, SearchType};
use crate::error::{Error, Result};
use crate::query::{Constraints, QueryParams};
use crate::response;
use crate::transport::{HttpTransport, Transport};

/// Value sent as the `format` parameter of every query.
pub const RESPONSE_FORMAT: &str = "application/solr+json";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which index nodes a query is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    /// Only the node behind the service URL (`distrib=false`).
    Local,
    /// Every peer known to the service (`distrib=true`).
    All,
    /// The listed shards (`distrib=true&shards=a,b`). Never empty.
    Shards(Vec<String>),
}

impl Distribution {
    pub fn from_distrib(distrib: bool) -> Self {
        if distrib {
            Distribution::All
        } else {
            Distribution::Local
        }
    }

    /// An empty list collapses to [`Distribution::Local`].
    pub fn from_shards(shards: Vec<String>) -> Self {
        if shards.is_empty() {
            Distribution::Local
        } else {
            Distribution::Shards(shards)
        }
    }

    pub fn is_distributed(&self) -> bool {
        !matches!(self, Distribution::Local)
    }

    fn shards_param(&self) -> Option<String> {
        match self {
            Distribution::Shards(shards) => Some(shards.join(",")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Search API endpoint, typically `https://<node>/esg-search/search`.
    pub url: String,
    pub distribution: Distribution,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            distribution: Distribution::All,
            verify: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolves settings from explicit values, then environment variables,
    /// then the first rc file found. See [`SearchConnection::from_env`].
    pub fn load(
        url: Option<String>,
        distrib: Option<bool>,
        shards: Option<Vec<String>>,
    ) -> Result<Self> {
        load_config(url, distrib, shards)
    }
}

/// Builds the context returned by [`SearchConnection::new_context`].
pub type ContextFactory = Arc<dyn Fn(SearchConnection, Constraints) -> Result<SearchContext>>;

/// A connection to an ESGF Search API service.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct SearchConnection {
    url: Url,
    distribution: Distribution,
    transport: Arc<dyn Transport>,
    context_factory: ContextFactory,
}

impl fmt::Debug for SearchConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConnection")
            .field("url", &self.url.as_str())
            .field("distribution", &self.distribution)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl SearchConnection {
    /// Connects to `url` with default settings: distributed over all shards,
    /// 60s timeout, TLS verification on.
    pub fn new(url: &str) -> Result<Self> {
        Self::from_config(ConnectionConfig::new(url))
    }

    /// Creates a connection from environment variables and/or `.esgfsearchrc`.
    ///
    /// Precedence is `ESGF_SEARCH_URL` / `ESGF_SEARCH_DISTRIB` /
    /// `ESGF_SEARCH_SHARDS` / `ESGF_SEARCH_TIMEOUT`, then the rc file named by
    /// `ESGF_SEARCH_RC`, then `./.esgfsearchrc` and `~/.esgfsearchrc`.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ConnectionConfig::load(None, None, None)?)
    }

    pub fn from_config(cfg: ConnectionConfig) -> Result<Self> {
        let url = Url::parse(&cfg.url)?;
        let transport = HttpTransport::new(cfg.timeout, cfg.verify)?;

        Ok(Self {
            url,
            distribution: cfg.distribution,
            transport: Arc::new(transport),
            context_factory: Arc::new(|conn: SearchConnection, constraints: Constraints| {
                SearchContext::new(conn, constraints, SearchType::Dataset)
            }),
        })
    }

    /// `false` restricts queries to the local node. `true` leaves an
    /// explicit shard list in place.
    pub fn with_distrib(mut self, distrib: bool) -> Self {
        self.distribution = match (distrib, self.distribution) {
            (false, _) => Distribution::Local,
            (true, Distribution::Local) => Distribution::All,
            (true, other) => other,
        };
        self
    }

    pub fn with_shards(mut self, shards: Vec<String>) -> Self {
        self.distribution = Distribution::from_shards(shards);
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = match distribution {
            Distribution::Shards(shards) => Distribution::from_shards(shards),
            other => other,
        };
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_context_factory(mut self, factory: ContextFactory) -> Self {
        self.context_factory = factory;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Sends one query and returns the parsed JSON reply.
    ///
    /// Fixed parameters (`format`, `limit`, `distrib`, `offset`, `shards`) come
    /// first, followed by every pair of `query`. Pairs without a value are not
    /// sent.
    pub fn execute_query(
        &self,
        query: &QueryParams,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Value> {
        let mut full = QueryParams::new();
        full.push("format", RESPONSE_FORMAT)
            .push_opt("limit", limit.map(|n| n.to_string()))
            .push(
                "distrib",
                if self.distribution.is_distributed() {
                    "true"
                } else {
                    "false"
                },
            )
            .push_opt("offset", offset.map(|n| n.to_string()))
            .push_opt("shards", self.distribution.shards_param());
        full.extend(query);

        let url = self.query_url(&full);
        debug!(url = %url, "Query request");

        let reply = self.transport.get(&url)?;
        if !reply.is_success() {
            return Err(Error::Status {
                status: reply.status,
                url: url.to_string(),
                body: reply.body,
            });
        }

        serde_json::from_str(&reply.body).map_err(|source| Error::InvalidJson {
            url: url.to_string(),
            source,
        })
    }

    /// Lists the shards a distributed query is sent to.
    pub fn shard_list(&self) -> Result<Vec<String>> {
        if !self.distribution.is_distributed() {
            return Err(Error::Usage(
                "shard list not available for non-distributed queries".to_string(),
            ));
        }

        let mut q = QueryParams::new();
        q.push("facets", "").push("fields", "");
        let doc = self.execute_query(&q, Some(0), None)?;
        let shards = response::shards(doc)?;
        debug!(count = shards.len(), "Fetched shard list");
        Ok(shards)
    }

    pub fn new_context(&self, constraints: Constraints) -> Result<SearchContext> {
        (self.context_factory)(self.clone(), constraints)
    }

    fn query_url(&self, params: &QueryParams) -> Url {
        let mut url = self.url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params.present() {
                pairs.append_pair(k, v);
            }
        }
        url
    }
}

use std::cell::OnceCell;
use std::fmt;
use tracing::debug;

use crate::connection::SearchConnection;
use crate::error::{Error, Result};
use crate::query::{Constraints, KeywordType, QueryParams};
use crate::response::{self, FacetCounts};
use crate::results::{DEFAULT_BATCH_SIZE, ResultSet};
use crate::records::SearchResult;

/// Record type searched for, sent as the `type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Dataset,
    File,
    Aggregation,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Dataset => "Dataset",
            SearchType::File => "File",
            SearchType::Aggregation => "Aggregation",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints for one search against a [`SearchConnection`].
///
/// The number of matching records is fetched at most once per context and
/// cached; [`SearchContext::constrain`] returns a fresh context with its own
/// count.
#[derive(Debug, Clone)]
pub struct SearchContext {
    connection: SearchConnection,
    search_type: SearchType,
    facet_constraints: Vec<(String, String)>,
    freetext: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    geospatial: Vec<(String, String)>,
    facets: Vec<String>,
    hit_count: OnceCell<usize>,
}

impl SearchContext {
    pub fn new(
        connection: SearchConnection,
        constraints: Constraints,
        search_type: SearchType,
    ) -> Result<Self> {
        let mut ctx = Self {
            connection,
            search_type,
            facet_constraints: Vec::new(),
            freetext: Vec::new(),
            start: None,
            end: None,
            geospatial: Vec::new(),
            facets: Vec::new(),
            hit_count: OnceCell::new(),
        };
        ctx.apply(&constraints)?;
        Ok(ctx)
    }

    /// Returns a new context with `constraints` added to the current ones.
    pub fn constrain(&self, constraints: Constraints) -> Result<Self> {
        let mut ctx = self.clone();
        ctx.hit_count = OnceCell::new();
        ctx.apply(&constraints)?;
        Ok(ctx)
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        if search_type != self.search_type {
            self.search_type = search_type;
            self.hit_count = OnceCell::new();
        }
        self
    }

    /// Facets whose value counts are requested with every query from this
    /// context, including [`SearchContext::facet_counts`].
    pub fn with_facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = facets.into_iter().map(Into::into).collect();
        self
    }

    fn apply(&mut self, constraints: &Constraints) -> Result<()> {
        for (key, value) in constraints.iter() {
            match KeywordType::classify(key) {
                KeywordType::Facet => self
                    .facet_constraints
                    .push((key.to_string(), value.to_string())),
                KeywordType::Freetext => self.freetext.push(value.to_string()),
                KeywordType::Temporal => {
                    if key == "start" {
                        self.start = Some(value.to_string());
                    } else {
                        self.end = Some(value.to_string());
                    }
                }
                KeywordType::Geospatial => {
                    self.geospatial.push((key.to_string(), value.to_string()))
                }
                KeywordType::System => {
                    return Err(Error::Usage(format!(
                        "`{}` is a system keyword and cannot be used as a constraint",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn connection(&self) -> &SearchConnection {
        &self.connection
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn facet_constraints(&self) -> &[(String, String)] {
        &self.facet_constraints
    }

    pub fn facet_values(&self, facet: &str) -> Vec<&str> {
        self.facet_constraints
            .iter()
            .filter(|(k, _)| k == facet)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn freetext(&self) -> Option<String> {
        if self.freetext.is_empty() {
            None
        } else {
            Some(self.freetext.join(" "))
        }
    }

    pub fn temporal(&self) -> (Option<&str>, Option<&str>) {
        (self.start.as_deref(), self.end.as_deref())
    }

    /// Query parameters describing this context, without paging.
    pub fn build_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.push("type", self.search_type.as_str());
        for (k, v) in &self.facet_constraints {
            q.push(k.as_str(), v.as_str());
        }
        q.push_opt("query", self.freetext())
            .push_opt("start", self.start.clone())
            .push_opt("end", self.end.clone());
        for (k, v) in &self.geospatial {
            q.push(k.as_str(), v.as_str());
        }
        if !self.facets.is_empty() {
            q.push("facets", self.facets.join(","));
        }
        q
    }

    /// Number of records matching this context.
    pub fn hit_count(&self) -> Result<usize> {
        if let Some(n) = self.hit_count.get() {
            return Ok(*n);
        }

        let doc = self
            .connection
            .execute_query(&self.build_query(), Some(0), None)?;
        let n = response::num_found(doc)?;
        debug!(hit_count = n, search_type = %self.search_type, "Fetched hit count");

        let _ = self.hit_count.set(n);
        Ok(n)
    }

    /// Value counts for the facets set with [`SearchContext::with_facets`],
    /// or for every facet when none were set.
    pub fn facet_counts(&self) -> Result<FacetCounts> {
        let mut q = self.build_query();
        if self.facets.is_empty() {
            q.push("facets", "*");
        }

        let doc = self.connection.execute_query(&q, Some(0), None)?;
        response::facet_counts(doc)
    }

    pub fn search(&self) -> Result<ResultSet<SearchResult>> {
        self.search_with(DEFAULT_BATCH_SIZE, true)
    }

    pub fn search_with(&self, batch_size: usize, eager: bool) -> Result<ResultSet<SearchResult>> {
        self.hit_count()?;
        ResultSet::new(self.clone(), batch_size, eager)
    }
}

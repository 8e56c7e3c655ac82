//! Lazily paged access to search results.
//!
//! A [`ResultSet`] presents every record matching a [`SearchContext`] as one
//! indexable sequence. Records are requested from the service in fixed-size
//! batches the first time an index inside the batch is read, and each batch is
//! kept for the lifetime of the result set.

use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::iter::FusedIterator;
use std::rc::Rc;
use tracing::debug;

use crate::context::SearchContext;
use crate::error::{Error, Result};
use crate::records::SearchResult;
use crate::response;

/// Records requested per batch by [`SearchContext::search`].
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Turns one raw record into the item type of a [`ResultSet`].
pub type ResultBuilder<T> = Box<dyn Fn(&Value, &SearchContext) -> T>;

type Batch = Rc<Vec<Value>>;

pub struct ResultSet<T = SearchResult> {
    context: SearchContext,
    batch_size: usize,
    len: usize,
    batch_cache: RefCell<Vec<Option<Batch>>>,
    build: ResultBuilder<T>,
}

impl<T> fmt::Debug for ResultSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("search_type", &self.context.search_type())
            .field("batch_size", &self.batch_size)
            .field("len", &self.len)
            .field("fetched_batches", &self.fetched_batches())
            .finish_non_exhaustive()
    }
}

impl ResultSet<SearchResult> {
    /// Creates a result set yielding [`SearchResult`] values matching the
    /// context's search type.
    ///
    /// With `eager`, the first batch is fetched before returning.
    pub fn new(context: SearchContext, batch_size: usize, eager: bool) -> Result<Self> {
        Self::with_builder(context, batch_size, eager, |json, ctx| {
            SearchResult::from_json(json.clone(), ctx.clone())
        })
    }
}

impl<T> ResultSet<T> {
    pub fn with_builder<F>(
        context: SearchContext,
        batch_size: usize,
        eager: bool,
        builder: F,
    ) -> Result<Self>
    where
        F: Fn(&Value, &SearchContext) -> T + 'static,
    {
        if batch_size == 0 {
            return Err(Error::Usage("batch size must be positive".to_string()));
        }

        let len = context.hit_count()?;
        let slots = len.div_ceil(batch_size);

        let set = Self {
            context,
            batch_size,
            len,
            batch_cache: RefCell::new(vec![None; slots]),
            build: Box::new(builder),
        };

        if eager && len > 0 {
            set.batch(0)?;
        }
        Ok(set)
    }

    /// Returns the record at `index`, fetching its batch if needed.
    pub fn get(&self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            });
        }

        let batch_i = index / self.batch_size;
        let offset = index % self.batch_size;
        let batch = self.batch(batch_i)?;

        let record = batch.get(offset).ok_or_else(|| {
            Error::Response(format!(
                "batch {} has {} record(s), expected at least {}",
                batch_i,
                batch.len(),
                offset + 1
            ))
        })?;

        Ok((self.build)(record, &self.context))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    /// Number of batches fetched so far.
    pub fn fetched_batches(&self) -> usize {
        self.batch_cache.borrow().iter().filter(|b| b.is_some()).count()
    }

    /// Iterates records in index order. The first failed fetch is yielded as
    /// an `Err` and ends the iteration; use [`ResultSet::get`] to retry.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { set: self, next: 0 }
    }

    fn batch(&self, batch_i: usize) -> Result<Batch> {
        if let Some(batch) = &self.batch_cache.borrow()[batch_i] {
            return Ok(Rc::clone(batch));
        }

        let offset = batch_i * self.batch_size;
        debug!(
            batch = batch_i,
            offset,
            limit = self.batch_size,
            "Fetching result batch"
        );

        let doc = self.context.connection().execute_query(
            &self.context.build_query(),
            Some(self.batch_size),
            Some(offset),
        )?;
        let batch: Batch = Rc::new(response::docs(doc)?);

        self.batch_cache.borrow_mut()[batch_i] = Some(Rc::clone(&batch));
        Ok(batch)
    }
}

/// Iterator over a [`ResultSet`], in index order.
pub struct Iter<'a, T> {
    set: &'a ResultSet<T>,
    next: usize,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.set.len() {
            return None;
        }
        let item = self.set.get(self.next);
        self.next = if item.is_err() {
            self.set.len()
        } else {
            self.next + 1
        };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.set.len().saturating_sub(self.next);
        (left.min(1), Some(left))
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a ResultSet<T> {
    type Item = Result<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

use crate::cache::{BoundedCache, CacheStats};
use crate::source::{DataSource, Result};
use crate::types::{Page, PageInfo, Row};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct PaginatorConfig {
    /// Rows per page. Fixed for the paginator's lifetime (default: 100).
    pub page_size: u64,
    /// Byte budget for the internal page cache (default: 16 MiB).
    pub cache_budget_bytes: usize,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            cache_budget_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Cumulative paginator counters. Diagnostic only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorStats {
    pub page_hits: u64,
    pub page_misses: u64,
    pub pages_fetched: u64,
    pub prefetches_spawned: u64,
}

/// Offset/limit pagination over one relation at a time, with an internal
/// byte-budgeted page cache and speculative warm-up of the next page.
///
/// The paginator does not detect relation switches: the caller sets the new
/// total and resets the cursor (via [`Paginator::first_page`] or
/// [`Paginator::go_to_page`]) when it changes relations, and calls
/// [`Paginator::clear_cache`] after mutations. Page indexes outside
/// `0..total_pages` are a caller error; `get_page_data` passes them through to
/// the data source unclamped, which simply yields an empty window.
#[derive(Debug)]
pub struct Paginator {
    config: PaginatorConfig,
    current_page: u64,
    total_rows: u64,
    total_pages: u64,
    cache: BoundedCache<Arc<Vec<Row>>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    stats: Arc<Mutex<PaginatorStats>>,
}

/// Cache keys embed the relation and page index, separated by a control
/// character so distinct (relation, page) pairs can never collide.
fn page_key(relation: &str, page_index: u64) -> String {
    format!("{relation}\u{1f}{page_index}")
}

impl Paginator {
    pub fn new(mut config: PaginatorConfig) -> Self {
        config.page_size = config.page_size.max(1);
        let cache = BoundedCache::new(config.cache_budget_bytes);
        Self {
            config,
            current_page: 0,
            total_rows: 0,
            total_pages: 0,
            cache,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            stats: Arc::new(Mutex::new(PaginatorStats::default())),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.config.page_size
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Set the relation's total row count and derive the page count.
    ///
    /// The cursor is left untouched; callers reset it explicitly when they
    /// switch relations.
    pub fn set_total_rows(&mut self, total: u64) {
        self.total_rows = total;
        self.total_pages = total.div_ceil(self.config.page_size);
    }

    /// Move the cursor to `page` if it is in range. Returns whether it moved.
    pub fn go_to_page(&mut self, page: u64) -> bool {
        if page < self.total_pages {
            self.current_page = page;
            true
        } else {
            false
        }
    }

    pub fn first_page(&mut self) {
        self.current_page = 0;
    }

    pub fn last_page(&mut self) -> bool {
        match self.total_pages.checked_sub(1) {
            Some(last) => {
                self.current_page = last;
                true
            }
            None => false,
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(prev) => {
                self.current_page = prev;
                true
            }
            None => false,
        }
    }

    /// Fetch page `page_index` of `relation`, serving from the internal cache
    /// when possible.
    ///
    /// On a miss this issues a `LIMIT page_size OFFSET page_index * page_size`
    /// fetch (restricted to `columns` when given, with the source's
    /// row-identity column prepended) and caches the result. Data-source
    /// errors propagate unmodified; there is no retry.
    pub fn get_page_data<S: DataSource>(
        &self,
        source: &S,
        relation: &str,
        page_index: u64,
        columns: Option<&[String]>,
    ) -> Result<Page> {
        let key = page_key(relation, page_index);
        if let Some(rows) = self.cache.get(&key) {
            self.stats.lock().expect("stats mutex poisoned").page_hits += 1;
            return Ok(Page {
                relation: relation.to_string(),
                page_index,
                rows,
            });
        }

        let offset = page_index.saturating_mul(self.config.page_size);
        let rows = source.fetch_range(relation, offset, self.config.page_size, columns)?;
        let rows = Arc::new(rows);
        {
            let mut stats = self.stats.lock().expect("stats mutex poisoned");
            stats.page_misses += 1;
            stats.pages_fetched += 1;
        }
        self.cache.set(key, Arc::clone(&rows));
        Ok(Page {
            relation: relation.to_string(),
            page_index,
            rows,
        })
    }

    /// Warm the cache with the page after `current_page` on a background
    /// thread.
    ///
    /// Fire-and-forget: there is no handle, no timeout, and no completion
    /// signal; callers must not assume the page is resident by any fixed
    /// time. A failed prefetch leaves the page absent, so the next
    /// synchronous request re-attempts it and surfaces the error normally.
    /// Redundant calls are no-ops while the page is cached or in flight.
    pub fn prefetch_next_page<S>(
        &self,
        source: &S,
        relation: &str,
        current_page: u64,
        columns: Option<&[String]>,
    ) where
        S: DataSource + Clone + Send + 'static,
    {
        let Some(next) = current_page.checked_add(1) else {
            return;
        };
        if next >= self.total_pages {
            return;
        }
        let key = page_key(relation, next);
        if self.cache.contains(&key) {
            return;
        }
        {
            let mut in_flight = self.in_flight.lock().expect("in-flight set mutex poisoned");
            if !in_flight.insert(key.clone()) {
                return;
            }
        }
        self.stats
            .lock()
            .expect("stats mutex poisoned")
            .prefetches_spawned += 1;

        let source = source.clone();
        let relation = relation.to_string();
        let columns: Option<Vec<String>> = columns.map(<[String]>::to_vec);
        let page_size = self.config.page_size;
        let cache = self.cache.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let stats = Arc::clone(&self.stats);

        thread::spawn(move || {
            let offset = next.saturating_mul(page_size);
            match source.fetch_range(&relation, offset, page_size, columns.as_deref()) {
                Ok(rows) => {
                    stats.lock().expect("stats mutex poisoned").pages_fetched += 1;
                    cache.set(key.clone(), Arc::new(rows));
                }
                Err(err) => {
                    // Warm-up is advisory; the next synchronous request
                    // re-attempts the fetch and surfaces the error.
                    tracing::debug!(relation = %relation, page = next, error = %err, "prefetch failed");
                }
            }
            in_flight
                .lock()
                .expect("in-flight set mutex poisoned")
                .remove(&key);
        });
    }

    /// Pagination state derived from the current cursor and totals.
    pub fn get_page_info(&self) -> PageInfo {
        let (start_row, end_row) = if self.total_rows == 0 {
            (0, 0)
        } else {
            let start = self
                .current_page
                .saturating_mul(self.config.page_size)
                .saturating_add(1);
            let end = self
                .current_page
                .saturating_add(1)
                .saturating_mul(self.config.page_size)
                .min(self.total_rows);
            (start, end)
        };
        PageInfo {
            current_page: self.current_page,
            total_pages: self.total_pages,
            page_size: self.config.page_size,
            total_rows: self.total_rows,
            start_row,
            end_row,
        }
    }

    /// Drop every cached page. Callers invoke this after mutations so the
    /// current page is re-fetched.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn stats(&self) -> PaginatorStats {
        *self.stats.lock().expect("stats mutex poisoned")
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PaginatorConfig::default())
    }
}

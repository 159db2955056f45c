//! Windowed data access and caching for the Tabula database browser.
//!
//! This crate is intentionally self-contained so it can sit behind the
//! desktop shell. It exposes:
//! - A [`DataSource`] abstraction over a queryable tabular backend, with a
//!   SQLite implementation
//! - Offset/limit pagination with an internal byte-budgeted LFU page cache
//!   and fire-and-forget prefetch of the next page
//! - Progressive chunk loading for incremental rendering
//! - Best-effort query bounding and index suggestions
//! - Operation timing aggregation for the status bar
//!
//! The UI drives all synchronous requests; the paginator's prefetch is the
//! only background work, and its sole observable effect is a cache write.

#![forbid(unsafe_code)]

mod cache;
mod chunk;
mod paginator;
mod scroll;
pub mod shaper;
mod source;
mod timing;
mod types;

pub use cache::{BoundedCache, CacheStats, CacheWeight};
pub use chunk::ChunkLoader;
pub use paginator::{Paginator, PaginatorConfig, PaginatorStats};
pub use scroll::ScrollWindow;
pub use source::{DataSource, Result, SourceError, SqliteSource};
pub use timing::{TimingMonitor, TimingStats};
pub use types::{ColumnInfo, Page, PageInfo, Row, Value};

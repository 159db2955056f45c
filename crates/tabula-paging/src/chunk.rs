use crate::source::{DataSource, Result};
use crate::types::Row;
use std::collections::HashSet;

/// Progressive chunk-at-a-time loader for callers that render incrementally
/// rather than by discrete pages.
///
/// Unlike [`crate::Paginator`] there is no cursor: a set records which chunks
/// have already been materialized, and re-requesting one is a no-op until
/// [`ChunkLoader::reset`].
#[derive(Debug)]
pub struct ChunkLoader {
    chunk_size: u64,
    loaded: HashSet<u64>,
}

impl ChunkLoader {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            loaded: HashSet::new(),
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn is_loaded(&self, chunk_index: u64) -> bool {
        self.loaded.contains(&chunk_index)
    }

    /// Fetch chunk `chunk_index` of `relation` and record it as loaded.
    ///
    /// Returns an empty vector without touching the data source when the
    /// chunk was already loaded. Data-source errors propagate unmodified and
    /// leave the chunk unrecorded.
    pub fn load_chunk<S: DataSource>(
        &mut self,
        source: &S,
        relation: &str,
        chunk_index: u64,
        columns: Option<&[String]>,
    ) -> Result<Vec<Row>> {
        self.load_chunk_with(source, relation, chunk_index, columns, |_, _| {})
    }

    /// Like [`ChunkLoader::load_chunk`], invoking `on_loaded` with the rows
    /// and chunk index after a real fetch (not after an already-loaded
    /// no-op).
    pub fn load_chunk_with<S, F>(
        &mut self,
        source: &S,
        relation: &str,
        chunk_index: u64,
        columns: Option<&[String]>,
        on_loaded: F,
    ) -> Result<Vec<Row>>
    where
        S: DataSource,
        F: FnOnce(&[Row], u64),
    {
        if self.loaded.contains(&chunk_index) {
            return Ok(Vec::new());
        }

        let offset = chunk_index.saturating_mul(self.chunk_size);
        let rows = source.fetch_range(relation, offset, self.chunk_size, columns)?;
        self.loaded.insert(chunk_index);
        on_loaded(&rows, chunk_index);
        Ok(rows)
    }

    /// Forget every loaded chunk, allowing re-fetches.
    pub fn reset(&mut self) {
        self.loaded.clear();
    }
}

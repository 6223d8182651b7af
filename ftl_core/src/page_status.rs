//! Dense page-status bitmap over the entire raw address space.

use crate::error::Error;

/// Tracks, for every raw page, whether it currently holds host data ("written") or is empty.
///
/// This table never distinguishes "valid" from "stale" at the page level beyond empty/written:
/// staleness is implied by the log-block directory shadowing an older copy at the home
/// location. The table is process-wide state owned exclusively by the [`crate::ftl::Ftl`]
/// instance it belongs to.
#[derive(Debug, Clone)]
pub struct PageStatusTable {
    written: Vec<bool>,
}

impl PageStatusTable {
    /// Create a table of `total_pages` entries, all initially empty.
    ///
    /// # Errors
    /// [`Error::OutOfMemory`] if the backing bitmap cannot be allocated.
    pub fn new(total_pages: u64) -> Result<Self, Error> {
        let n = usize::try_from(total_pages).map_err(|_| Error::OutOfMemory)?;
        let mut written = Vec::new();
        written
            .try_reserve_exact(n)
            .map_err(|_| Error::OutOfMemory)?;
        written.resize(n, false);
        Ok(Self { written })
    }

    /// Whether `lba` currently holds written data.
    #[must_use]
    pub fn is_written(&self, lba: u64) -> bool {
        self.written[usize::try_from(lba).unwrap()]
    }

    /// Mark `lba` as written. Idempotent.
    pub fn mark_written(&mut self, lba: u64) {
        self.written[usize::try_from(lba).unwrap()] = true;
    }

    /// Mark `lba` as empty. Used by garbage collection to clear a reclaimed log block's
    /// shadow before restoring data to the home block.
    pub fn mark_empty(&mut self, lba: u64) {
        self.written[usize::try_from(lba).unwrap()] = false;
    }

    /// The total number of pages tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.written.len()
    }

    /// Whether the table tracks zero pages (geometry validation should prevent this).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

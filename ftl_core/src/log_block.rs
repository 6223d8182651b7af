//! Log-block directory: the mapping from a data block to the reserved log block currently
//! absorbing its rewrites.

use std::collections::HashMap;

use crate::address::Address;
use crate::error::Error;

/// A reserved log block bound to exactly one data block, with an ordered record of which
/// home-block page offset each of its physical pages currently mirrors.
#[derive(Debug, Clone)]
pub struct LogBlockEntry {
    /// The physical location `(package, die, plane, block)` of the reserved block.
    pub physical_location: (u32, u32, u32, u32),
    /// Slot `i` holds the home-block page offset currently written at physical page `i`, or
    /// `None` if that slot has never been written since the block's last erase.
    ///
    /// Slot index is write order: the lowest-index non-empty slot is the oldest copy still
    /// present, the highest-index non-empty slot is the newest.
    page_entries: Vec<Option<u32>>,
}

impl LogBlockEntry {
    fn new(physical_location: (u32, u32, u32, u32), block_size: u32) -> Self {
        Self {
            physical_location,
            page_entries: vec![None; block_size as usize],
        }
    }

    /// The physical address of slot `index` within this log block.
    #[must_use]
    pub fn slot_address(&self, index: u32) -> Address {
        let (package, die, plane, block) = self.physical_location;
        Address::page(package, die, plane, block, index)
    }

    /// The index of the first empty slot, if any.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<u32> {
        self.page_entries
            .iter()
            .position(Option::is_none)
            .map(|i| i as u32)
    }

    /// The slot holding the most recent copy of `page_offset`, scanning from the highest
    /// index downward so that the newest write wins.
    #[must_use]
    pub fn latest_slot_for_offset(&self, page_offset: u32) -> Option<u32> {
        self.page_entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| **entry == Some(page_offset))
            .map(|(i, _)| i as u32)
    }

    /// Record that slot `index` now mirrors `page_offset`.
    pub fn set_slot(&mut self, index: u32, page_offset: u32) {
        self.page_entries[index as usize] = Some(page_offset);
    }

    /// Reset every slot to empty, used immediately after garbage collection erases this
    /// block's physical contents.
    pub fn reset(&mut self) {
        self.page_entries.iter_mut().for_each(|e| *e = None);
    }

    /// Number of slots (equal to `BLOCK_SIZE`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.page_entries.len()
    }

    /// Whether this entry has zero slots (geometry validation should prevent this).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.page_entries.is_empty()
    }
}

/// Maps a data-block index to the log block currently bound to it.
///
/// At most one entry exists per data block. Once created, an entry's binding to its physical
/// log block is permanent for the life of the FTL; garbage collection only resets its
/// `page_entries`, never removes the entry. Allocation order is therefore monotonic, which is
/// what lets [`LogBlockDirectory::next_allocation_index`] double as both "how many log blocks
/// have ever been allocated" and "the linear index the next allocation will use".
#[derive(Debug, Clone, Default)]
pub struct LogBlockDirectory {
    entries: HashMap<u64, LogBlockEntry>,
    block_size: u32,
}

impl LogBlockDirectory {
    /// An empty directory for a flash geometry with the given `block_size`.
    #[must_use]
    pub fn new(block_size: u32) -> Self {
        Self {
            entries: HashMap::new(),
            block_size,
        }
    }

    /// Whether a log block is currently bound to `data_block_index`.
    #[must_use]
    pub fn has(&self, data_block_index: u64) -> bool {
        self.entries.contains_key(&data_block_index)
    }

    /// Borrow the entry bound to `data_block_index`.
    ///
    /// # Panics
    /// Panics if no entry is bound (callers must check [`Self::has`] first, matching the
    /// distilled spec's precondition).
    #[must_use]
    pub fn get(&self, data_block_index: u64) -> &LogBlockEntry {
        self.entries
            .get(&data_block_index)
            .expect("get() requires has() to be true")
    }

    /// Mutably borrow the entry bound to `data_block_index`.
    ///
    /// # Panics
    /// Panics if no entry is bound.
    pub fn get_mut(&mut self, data_block_index: u64) -> &mut LogBlockEntry {
        self.entries
            .get_mut(&data_block_index)
            .expect("get_mut() requires has() to be true")
    }

    /// The number of currently-bound log blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no bound log blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind a freshly allocated log block at `physical_location` to `data_block_index`.
    ///
    /// Callers are responsible for checking capacity (`len() < reservation capacity`) before
    /// calling; this type has no notion of the overall reservation size.
    ///
    /// # Errors
    /// [`Error::OutOfMemory`] if the directory cannot grow to hold the new entry.
    pub fn create(
        &mut self,
        data_block_index: u64,
        physical_location: (u32, u32, u32, u32),
    ) -> Result<&mut LogBlockEntry, Error> {
        self.entries
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory)?;
        self.entries.insert(
            data_block_index,
            LogBlockEntry::new(physical_location, self.block_size),
        );
        Ok(self
            .entries
            .get_mut(&data_block_index)
            .expect("just inserted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LogBlockEntry {
        LogBlockEntry::new((0, 0, 0, 9), 4)
    }

    #[test]
    fn fresh_entry_has_no_mapped_slots() {
        let e = entry();
        assert_eq!(e.first_empty_slot(), Some(0));
        assert_eq!(e.latest_slot_for_offset(0), None);
    }

    #[test]
    fn set_slot_makes_it_the_latest_for_that_offset() {
        let mut e = entry();
        e.set_slot(0, 2);
        assert_eq!(e.latest_slot_for_offset(2), Some(0));
        assert_eq!(e.first_empty_slot(), Some(1));
    }

    #[test]
    fn repeated_writes_to_same_offset_return_newest_slot() {
        let mut e = entry();
        e.set_slot(0, 2);
        e.set_slot(1, 2);
        e.set_slot(3, 2);
        assert_eq!(e.latest_slot_for_offset(2), Some(3));
    }

    #[test]
    fn reset_clears_all_slots() {
        let mut e = entry();
        e.set_slot(0, 1);
        e.set_slot(1, 2);
        e.reset();
        assert_eq!(e.first_empty_slot(), Some(0));
        assert_eq!(e.latest_slot_for_offset(1), None);
        assert_eq!(e.latest_slot_for_offset(2), None);
    }

    #[test]
    fn full_block_has_no_empty_slot() {
        let mut e = entry();
        for i in 0..4 {
            e.set_slot(i, i);
        }
        assert_eq!(e.first_empty_slot(), None);
    }

    #[test]
    fn directory_starts_empty() {
        let d = LogBlockDirectory::new(4);
        assert!(!d.has(0));
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn create_then_has_and_get_succeed() {
        let mut d = LogBlockDirectory::new(4);
        d.create(5, (0, 0, 0, 20)).unwrap();
        assert!(d.has(5));
        assert_eq!(d.get(5).physical_location, (0, 0, 0, 20));
        assert_eq!(d.len(), 1);
    }

    #[test]
    #[should_panic(expected = "has() to be true")]
    fn get_panics_when_unbound() {
        let d = LogBlockDirectory::new(4);
        d.get(0);
    }

    #[test]
    fn create_overwrites_any_previous_entry_for_the_same_data_block() {
        let mut d = LogBlockDirectory::new(4);
        d.create(5, (0, 0, 0, 20)).unwrap();
        d.get_mut(5).set_slot(0, 1);
        d.create(5, (0, 0, 0, 21)).unwrap();
        assert_eq!(d.get(5).physical_location, (0, 0, 0, 21));
        assert_eq!(d.get(5).first_empty_slot(), Some(0));
    }

    /// Random sequence of slot writes and resets checked against a naive `Vec<Option<u32>>`
    /// model, mirroring the teacher's randomized allocate/free stress test for its handle
    /// allocator.
    #[test]
    fn random_slot_writes_and_resets_match_a_naive_model() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x5EED);
        let block_size = 4u32;
        let mut e = LogBlockEntry::new((0, 0, 0, 0), block_size);
        let mut model: Vec<Option<u32>> = vec![None; block_size as usize];

        for _ in 0..500 {
            if rng.gen_bool(0.15) {
                e.reset();
                model.iter_mut().for_each(|s| *s = None);
                continue;
            }
            let slot = rng.gen_range(0..block_size);
            let offset = rng.gen_range(0..8);
            e.set_slot(slot, offset);
            model[slot as usize] = Some(offset);

            assert_eq!(
                e.first_empty_slot(),
                model.iter().position(Option::is_none).map(|i| i as u32)
            );
            for check_offset in 0..8 {
                let expected = model
                    .iter()
                    .enumerate()
                    .rev()
                    .find(|(_, s)| **s == Some(check_offset))
                    .map(|(i, _)| i as u32);
                assert_eq!(e.latest_slot_for_offset(check_offset), expected);
            }
        }
    }
}

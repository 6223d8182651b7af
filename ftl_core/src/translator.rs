//! Address translation: the oldest-first log-fill write policy and the shadow-aware read
//! policy.
//!
//! Grounded on `Ftl::translate`, `Ftl::write_event` and `Ftl::read_event` in the original
//! implementation. The policy is reproduced faithfully; only the `-1` sentinel for "slot
//! unmapped" is replaced throughout by `Option<u32>`.

use crate::address::{decompose_block_index, Address};
use crate::controller::Controller;
use crate::error::{Error, NoLogBlockAvailableSnafu, OverProvisionedRangeSnafu, UnwrittenReadSnafu};
use crate::ftl::Ftl;
use crate::gc;
use crate::logging::LogSink;
use snafu::ensure;

impl<C: Controller, S: LogSink> Ftl<C, S> {
    /// Resolve `lba` to the physical address a write should target, applying the log-fill
    /// policy and triggering garbage collection if the bound log block is full.
    ///
    /// As a side effect, records the home block's physical coordinates so that a triggered
    /// collection can run without recomputing them.
    pub(crate) fn translate_write(&mut self, lba: u64) -> Result<Address, Error> {
        ensure!(
            lba < self.derived.data_region_end_lba(),
            OverProvisionedRangeSnafu { lba }
        );

        let block_size = u64::from(self.derived.geometry.block_size);
        let h = lba / block_size;
        let offset = (lba % block_size) as u32;
        let home = decompose_block_index(&self.derived, h);
        self.cached_home = Some((home.package, home.die, home.plane, home.block));

        if !self.page_status.is_written(lba) {
            self.page_status.mark_written(lba);
            return Ok(home.with_page(offset));
        }

        if self.directory.has(h) {
            if let Some(slot) = self.directory.get(h).first_empty_slot() {
                self.directory.get_mut(h).set_slot(slot, offset);
                return Ok(self.directory.get(h).slot_address(slot));
            }

            let cached_home = self.cached_home.expect("just set above");
            gc::run(
                &mut self.controller,
                &self.derived,
                &mut self.page_status,
                &mut self.directory,
                cached_home,
                h,
            )?;
            self.directory.get_mut(h).set_slot(0, offset);
            return Ok(self.directory.get(h).slot_address(0));
        }

        ensure!(
            (self.directory.len() as u64) < self.derived.log_reservation_capacity(),
            NoLogBlockAvailableSnafu
        );

        let k = self.directory.len() as u64;
        let block_index = self.derived.log_block_index(k);
        let phys = decompose_block_index(&self.derived, block_index);
        let entry = self
            .directory
            .create(h, (phys.package, phys.die, phys.plane, phys.block))?;
        entry.set_slot(0, offset);
        Ok(entry.slot_address(0))
    }

    /// Resolve `lba` to the physical address a read should target: the newest log-block
    /// shadow for that offset if one exists, otherwise the home block.
    pub(crate) fn translate_read(&self, lba: u64) -> Result<Address, Error> {
        ensure!(self.page_status.is_written(lba), UnwrittenReadSnafu { lba });

        let block_size = u64::from(self.derived.geometry.block_size);
        let h = lba / block_size;
        let offset = (lba % block_size) as u32;

        if self.directory.has(h) {
            if let Some(slot) = self.directory.get(h).latest_slot_for_offset(offset) {
                return Ok(self.directory.get(h).slot_address(slot));
            }
        }

        Ok(decompose_block_index(&self.derived, h).with_page(offset))
    }
}

//! Four-phase garbage collection: merge a data block and its bound log block into the
//! reserved cleaning block, erase both originals, restore the merged contents to the data
//! block, then erase the cleaning block so it is ready for the next collection.
//!
//! Grounded on `Garbage_collector::{collect, perform_cleaning, merge_data_and_log_block,
//! erase_data_and_log_block, copy_cleaning_block_to_data_block, erase_cleaning_block}` in the
//! original implementation; translated here into a single synchronous pass since this core has
//! no asynchronous event queue.

use crate::address::{compose_block_base, decompose_block_index, Address};
use crate::controller::Controller;
use crate::error::Error;
use crate::event::{Event, Kind};
use crate::geometry::Derived;
use crate::log_block::LogBlockDirectory;
use crate::page_status::PageStatusTable;

/// Run all four phases for the data block `h`, using `cached_home` (the physical location of
/// `h`, computed by the caller before invoking this function) as the merge/restore target.
///
/// On return, the log block bound to `h` has been erased and its directory entry reset to
/// empty; the caller is responsible for re-populating slot `0` with the write that triggered
/// collection.
pub(crate) fn run<C: Controller>(
    controller: &mut C,
    derived: &Derived,
    page_status: &mut PageStatusTable,
    directory: &mut LogBlockDirectory,
    cached_home: (u32, u32, u32, u32),
    h: u64,
) -> Result<(), Error> {
    let block_size = derived.geometry.block_size;
    let home_base = compose_block_base(
        derived,
        cached_home.0,
        cached_home.1,
        cached_home.2,
        cached_home.3,
    );
    let home_phys = Address::block(cached_home.0, cached_home.1, cached_home.2, cached_home.3);

    let cleaning_addr = decompose_block_index(derived, derived.cleaning_block_index);
    let cleaning_phys = Address::block(
        cleaning_addr.package,
        cleaning_addr.die,
        cleaning_addr.plane,
        cleaning_addr.block,
    );
    let cleaning_base = derived.cleaning_block_index * u64::from(block_size);

    // Phase M: merge the newest copy of every offset (log block if shadowed, home block
    // otherwise) into the cleaning block.
    for p in 0..block_size {
        let log_entry = directory.get(h);
        if let Some(slot) = log_entry.latest_slot_for_offset(p) {
            let log_base = compose_block_base(
                derived,
                log_entry.physical_location.0,
                log_entry.physical_location.1,
                log_entry.physical_location.2,
                log_entry.physical_location.3,
            );
            let source = log_entry.slot_address(slot);
            issue(controller, Kind::Read, log_base + u64::from(slot), source)?;
        } else if page_status.is_written(home_base + u64::from(p)) {
            issue(
                controller,
                Kind::Read,
                home_base + u64::from(p),
                home_phys.with_page(p),
            )?;
        } else {
            continue;
        }
        issue(
            controller,
            Kind::Write,
            cleaning_base + u64::from(p),
            cleaning_phys.with_page(p),
        )?;
    }

    // Phase E1: erase both originals; the cleaning block now holds the only live copy.
    issue(controller, Kind::Erase, home_base, home_phys)?;
    let log_entry = directory.get(h);
    let log_base = compose_block_base(
        derived,
        log_entry.physical_location.0,
        log_entry.physical_location.1,
        log_entry.physical_location.2,
        log_entry.physical_location.3,
    );
    let log_block_phys = Address::block(
        log_entry.physical_location.0,
        log_entry.physical_location.1,
        log_entry.physical_location.2,
        log_entry.physical_location.3,
    );
    issue(controller, Kind::Erase, log_base, log_block_phys)?;

    // Phase R: restore every written offset from the cleaning block back to the (freshly
    // erased) home block.
    for p in 0..block_size {
        if page_status.is_written(home_base + u64::from(p)) {
            issue(
                controller,
                Kind::Read,
                cleaning_base + u64::from(p),
                cleaning_phys.with_page(p),
            )?;
            issue(
                controller,
                Kind::Write,
                home_base + u64::from(p),
                home_phys.with_page(p),
            )?;
        }
    }

    // Phase E2: erase the cleaning block so it is ready for the next collection.
    issue(controller, Kind::Erase, cleaning_base, cleaning_phys)?;

    directory.get_mut(h).reset();
    Ok(())
}

fn issue<C: Controller>(
    controller: &mut C,
    kind: Kind,
    lba: u64,
    address: Address,
) -> Result<(), Error> {
    let mut event = Event::with_physical_address(kind, lba, address);
    controller
        .issue(&mut event)
        .map_err(|_| Error::GarbageCollectionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::InMemoryDevice;
    use crate::geometry::Geometry;
    use crate::log_block::LogBlockDirectory;

    fn small() -> Derived {
        Geometry {
            ssd_size: 1,
            package_size: 1,
            die_size: 1,
            plane_size: 4,
            block_size: 4,
            overprovisioning: 50,
        }
        .derive()
        .unwrap()
    }

    #[test]
    fn collection_restores_every_written_offset_and_resets_the_log_entry() {
        let derived = small();
        let mut device = InMemoryDevice::new(100);
        let mut page_status = PageStatusTable::new(derived.total_pages).unwrap();
        let mut directory = LogBlockDirectory::new(derived.geometry.block_size);

        // h = 0 lives at block 0; write its first two offsets directly (simulating
        // first-touch writes that bypassed the log path).
        let home = decompose_block_index(&derived, 0);
        let home_key = (home.package, home.die, home.plane, home.block);
        for p in 0..2u32 {
            let mut w = Event::with_physical_address(Kind::Write, u64::from(p), home.with_page(p));
            device.issue(&mut w).unwrap();
            page_status.mark_written(u64::from(p));
        }

        // Bind a log block to h and shadow offset 1 with a newer copy.
        let log_block_index = derived.log_block_index(0);
        let log_addr = decompose_block_index(&derived, log_block_index);
        let log_loc = (log_addr.package, log_addr.die, log_addr.plane, log_addr.block);
        let entry = directory.create(0, log_loc).unwrap();
        entry.set_slot(0, 1);
        let slot_addr = entry.slot_address(0);
        let mut w = Event::with_physical_address(Kind::Write, 100, slot_addr);
        device.issue(&mut w).unwrap();

        run(&mut device, &derived, &mut page_status, &mut directory, home_key, 0).unwrap();

        assert_eq!(directory.get(0).first_empty_slot(), Some(0));
        assert_eq!(device.total_erases_performed(), 3);

        // Offsets 0 and 1 must both be readable again at the home block after restore.
        let mut r0 = Event::with_physical_address(Kind::Read, 0, home.with_page(0));
        device.issue(&mut r0).unwrap();
        let mut r1 = Event::with_physical_address(Kind::Read, 1, home.with_page(1));
        device.issue(&mut r1).unwrap();
    }

    #[test]
    fn collection_on_a_block_with_no_log_shadow_still_cycles_the_cleaning_block() {
        let derived = small();
        let mut device = InMemoryDevice::new(100);
        let mut page_status = PageStatusTable::new(derived.total_pages).unwrap();
        let mut directory = LogBlockDirectory::new(derived.geometry.block_size);

        let home = decompose_block_index(&derived, 0);
        let home_key = (home.package, home.die, home.plane, home.block);
        let mut w = Event::with_physical_address(Kind::Write, 0, home.with_page(0));
        device.issue(&mut w).unwrap();
        page_status.mark_written(0);

        let log_block_index = derived.log_block_index(0);
        let log_addr = decompose_block_index(&derived, log_block_index);
        let log_loc = (log_addr.package, log_addr.die, log_addr.plane, log_addr.block);
        directory.create(0, log_loc).unwrap();

        run(&mut device, &derived, &mut page_status, &mut directory, home_key, 0).unwrap();

        let mut r = Event::with_physical_address(Kind::Read, 0, home.with_page(0));
        device.issue(&mut r).unwrap();
    }
}

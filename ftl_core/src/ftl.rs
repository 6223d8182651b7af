//! The flash translation layer façade: owns the page-status table, the log-block directory,
//! and the device controller, and exposes the host-facing `read`/`write`/`erase`/`merge`
//! operations.
//!
//! Grounded on `Ftl::{read,write,erase,merge,garbage_collect}` in the original implementation
//! for the operation surface and the log trace wording, and on the teacher's pattern of a
//! single struct owning all process-wide state behind small `ensure!`-guarded methods (see
//! `memory::buddy::BuddyAllocator`).

use std::collections::HashMap;

use crate::address::Address;
use crate::controller::Controller;
use crate::error::Error;
use crate::event::{Event, Kind};
use crate::geometry::{Geometry, InvalidGeometry};
use crate::log_block::LogBlockDirectory;
use crate::logging::{GlobalLogSink, LogSink};
use crate::page_status::PageStatusTable;

/// The flash translation layer: translates host LBAs to physical addresses, maintains the
/// log-block directory, and triggers garbage collection as needed.
///
/// Generic over the [`Controller`] the FTL issues resolved events against and the [`LogSink`]
/// it traces through. Both default to the production implementations; tests substitute a
/// mock controller or a collecting sink.
#[derive(Debug)]
pub struct Ftl<C: Controller, S: LogSink = GlobalLogSink> {
    pub(crate) derived: crate::geometry::Derived,
    pub(crate) page_status: PageStatusTable,
    pub(crate) directory: LogBlockDirectory,
    pub(crate) controller: C,
    sink: S,
    reference_map: HashMap<u64, Address>,
    /// The physical coordinates of the data block most recently touched by a write, cached so
    /// a triggered garbage collection does not need to recompute them.
    pub(crate) cached_home: Option<(u32, u32, u32, u32)>,
}

impl<C: Controller> Ftl<C, GlobalLogSink> {
    /// Build an FTL over `geometry`, tracing through the global `log` crate.
    ///
    /// # Errors
    /// - Propagates [`InvalidGeometry`] if `geometry` fails validation.
    /// - Returns [`Error::OutOfMemory`] if the page-status bitmap cannot be allocated.
    pub fn new(geometry: Geometry, controller: C) -> Result<Self, FtlConstructionError> {
        Self::with_sink(geometry, controller, GlobalLogSink)
    }
}

impl<C: Controller, S: LogSink> Ftl<C, S> {
    /// Build an FTL over `geometry`, tracing through the given `sink`.
    ///
    /// # Errors
    /// - Propagates [`InvalidGeometry`] if `geometry` fails validation.
    /// - Returns [`Error::OutOfMemory`] if the page-status bitmap cannot be allocated.
    pub fn with_sink(
        geometry: Geometry,
        controller: C,
        sink: S,
    ) -> Result<Self, FtlConstructionError> {
        let derived = geometry
            .derive()
            .map_err(|source| FtlConstructionError::Geometry { source })?;
        let page_status = PageStatusTable::new(derived.total_pages)
            .map_err(|source| FtlConstructionError::Allocation { source })?;
        Ok(Self {
            derived,
            page_status,
            directory: LogBlockDirectory::new(derived.geometry.block_size),
            controller,
            sink,
            reference_map: HashMap::new(),
            cached_home: None,
        })
    }

    /// The flash geometry this FTL was built over.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.derived.geometry
    }

    /// The quantities derived from the geometry (totals, reservation sizes, and so on).
    #[must_use]
    pub fn derived(&self) -> &crate::geometry::Derived {
        &self.derived
    }

    /// The current data-block → log-block binding, for introspection and tests.
    #[must_use]
    pub fn directory(&self) -> &LogBlockDirectory {
        &self.directory
    }

    /// The last physical address every LBA was resolved to, for introspection and tests.
    #[must_use]
    pub fn reference_map(&self) -> &HashMap<u64, Address> {
        &self.reference_map
    }

    /// Service a host read of `event.lba`, resolving its physical address and issuing it
    /// against the controller.
    ///
    /// # Errors
    /// [`Error::UnwrittenRead`] if the LBA has never been written, or [`Error::DeviceFailure`]
    /// if the controller rejects the resolved event.
    pub fn read(&mut self, event: &mut Event) -> Result<(), Error> {
        match self.translate_read(event.lba) {
            Ok(address) => {
                self.sink.accept(&format!(
                    "read: LBA {} mapped to PBA ({}, {}, {}, {}, {})",
                    event.lba, address.package, address.die, address.plane, address.block, address.page
                ));
                event.physical_address = Some(address);
                self.reference_map.insert(event.lba, address);
                self.controller
                    .issue(event)
                    .map_err(|_| Error::DeviceFailure)
            }
            Err(err) => {
                self.sink
                    .accept(&format!("read: invalid mapping of LBA {}", event.lba));
                Err(err)
            }
        }
    }

    /// Service a host write of `event.lba`, resolving its physical address (triggering garbage
    /// collection if needed) and issuing it against the controller.
    ///
    /// # Errors
    /// [`Error::OverProvisionedRange`] if the LBA is outside the host-addressable region,
    /// [`Error::NoLogBlockAvailable`] if a rewrite needs a fresh log block and none remain,
    /// [`Error::GarbageCollectionFailed`] if a triggered collection fails, or
    /// [`Error::DeviceFailure`] if the controller rejects the resolved event.
    pub fn write(&mut self, event: &mut Event) -> Result<(), Error> {
        match self.translate_write(event.lba) {
            Ok(address) => {
                self.sink.accept(&format!(
                    "write: LBA {} mapped to PBA ({}, {}, {}, {}, {})",
                    event.lba, address.package, address.die, address.plane, address.block, address.page
                ));
                event.physical_address = Some(address);
                self.reference_map.insert(event.lba, address);
                self.controller
                    .issue(event)
                    .map_err(|_| Error::DeviceFailure)
            }
            Err(err) => {
                self.sink
                    .accept(&format!("write: invalid mapping of LBA {}", event.lba));
                Err(err)
            }
        }
    }

    /// Service a host erase. Only read and write events arrive from the host in this core;
    /// erase is reachable only through garbage collection's own sub-events, which bypass this
    /// method entirely and call the controller directly. This entry point exists for
    /// completeness and resolves its address through the same path as [`Self::write`].
    ///
    /// # Errors
    /// See [`Self::write`].
    pub fn erase(&mut self, event: &mut Event) -> Result<(), Error> {
        debug_assert_eq!(event.kind, Kind::Erase);
        self.write(event)
    }

    /// Service a host merge. As with [`Self::erase`], this core never receives merge events
    /// from the host; this entry point resolves its address through the same path as
    /// [`Self::write`] for completeness.
    ///
    /// # Errors
    /// See [`Self::write`].
    pub fn merge(&mut self, event: &mut Event) -> Result<(), Error> {
        debug_assert_eq!(event.kind, Kind::Merge);
        self.write(event)
    }

    /// Wear-leveling hook. The original implementation's wear leveler always reports failure
    /// and is never invoked on the write path; this core keeps the seam but never calls it
    /// itself, so it is inert.
    ///
    /// # Errors
    /// Never returns an error; the signature matches the other host-facing operations for
    /// uniformity.
    pub fn level(&mut self, _event: &mut Event) -> Result<(), Error> {
        Ok(())
    }
}

/// Errors that can arise while constructing an [`Ftl`].
#[derive(Debug, snafu::Snafu)]
pub enum FtlConstructionError {
    /// The supplied geometry failed validation.
    #[snafu(display("invalid geometry: {source}"))]
    Geometry {
        /// The underlying geometry error.
        source: InvalidGeometry,
    },
    /// The page-status bitmap could not be allocated.
    #[snafu(display("failed to allocate FTL state: {source}"))]
    Allocation {
        /// The underlying allocation error.
        source: Error,
    },
}

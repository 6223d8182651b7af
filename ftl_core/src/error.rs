//! Errors produced by the translation and garbage-collection paths.

use snafu::Snafu;

/// Errors that can arise while translating or servicing a host event.
#[derive(Debug, Snafu, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Error {
    /// The LBA falls in the overprovisioned region, which the host may never address directly.
    #[snafu(display("LBA {lba} is in the overprovisioned range"))]
    OverProvisionedRange {
        /// The offending LBA.
        lba: u64,
    },

    /// A read was issued to an LBA that has never been written.
    #[snafu(display("LBA {lba} has never been written"))]
    UnwrittenRead {
        /// The offending LBA.
        lba: u64,
    },

    /// A rewrite needed a fresh log block but the log reservation is exhausted.
    NoLogBlockAvailable,

    /// The device controller rejected a sub-event issued directly by the FTL.
    DeviceFailure,

    /// A sub-event issued during garbage collection was rejected by the controller.
    ///
    /// Garbage collection is not retried; this error is fatal to the triggering write.
    GarbageCollectionFailed,

    /// A table or bitmap could not be grown or allocated.
    ///
    /// This is fatal: callers should terminate rather than attempt to continue with
    /// inconsistent state.
    OutOfMemory,
}

/// Convenience alias for results produced by this crate's translation/GC paths.
pub type Result<T, E = Error> = core::result::Result<T, E>;

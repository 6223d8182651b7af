//! The host/device event that flows through translation and execution.

use crate::address::Address;

/// The kind of request an [`Event`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Read a single page.
    Read,
    /// Write a single page.
    Write,
    /// Erase a single block.
    Erase,
    /// Merge (treated as a pass-through write for state-tracking purposes).
    Merge,
}

/// A single-page request as it travels from the host, through translation, to the device
/// controller and back.
///
/// `size` is always `1` in this core: multi-page requests are a declared non-goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// The kind of request.
    pub kind: Kind,
    /// The logical block address the host addressed.
    pub lba: u64,
    /// Always `1` in this core.
    pub size: u32,
    /// The time at which the host issued the request.
    pub start_time: u64,
    /// The physical address resolved by translation (or pre-set, for GC sub-events).
    pub physical_address: Option<Address>,
    /// Time taken to service the event, filled in by the controller.
    pub time_taken: u64,
}

impl Event {
    /// Construct a fresh host-facing event with no physical address resolved yet.
    #[must_use]
    pub fn new(kind: Kind, lba: u64, start_time: u64) -> Self {
        Self {
            kind,
            lba,
            size: 1,
            start_time,
            physical_address: None,
            time_taken: 0,
        }
    }

    /// Construct a sub-event with its physical address pre-set, as issued internally during
    /// garbage collection (bypassing translation).
    #[must_use]
    pub fn with_physical_address(kind: Kind, lba: u64, address: Address) -> Self {
        Self {
            kind,
            lba,
            size: 1,
            start_time: 0,
            physical_address: Some(address),
            time_taken: 0,
        }
    }
}

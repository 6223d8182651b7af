//! The device-controller contract the FTL issues resolved events against, plus a minimal
//! in-memory implementation sufficient to run the translator and garbage collector end to end.
//!
//! The physical device model proper — packages, dies, planes, bus timing — is named in the
//! distilled spec as an external collaborator referenced only via this contract. The
//! [`InMemoryDevice`] below exists to close the loop for tests and the `ftl_sim` binary; it is
//! deliberately not a realistic device (see module docs on [`InMemoryDevice`]).

use std::collections::HashMap;

use snafu::{ensure, Snafu};

use crate::address::Address;
use crate::event::{Event, Kind};

/// Errors a [`Controller`] implementation can report back to the FTL.
#[derive(Debug, Snafu, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum ControllerError {
    /// A write (or merge) targeted a page that is already valid.
    #[snafu(display("page is already valid, cannot write without an intervening erase"))]
    PageAlreadyValid,

    /// A read targeted a page that has never been written.
    #[snafu(display("page is empty, cannot read"))]
    PageEmpty,

    /// An erase targeted a block whose erase budget is exhausted.
    #[snafu(display("block has no erases remaining"))]
    EraseBudgetExhausted,
}

/// The seam the FTL talks to: execute one resolved, single-page event against physical
/// storage.
///
/// Implementers must provide their own internal bookkeeping; the FTL never reaches into a
/// controller's internals; it only ever calls `issue`.
#[cfg_attr(test, mockall::automock)]
pub trait Controller {
    /// Execute `event`, which must already carry a resolved `physical_address`.
    ///
    /// # Errors
    /// Returns [`ControllerError`] if the device model rejects the sub-event (e.g. a write to
    /// an already-valid page, a read of an empty page, or an erase of a block with no erases
    /// remaining).
    fn issue(&mut self, event: &mut Event) -> Result<(), ControllerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Empty,
    Valid,
}

/// A minimal, non-realistic in-memory device model implementing [`Controller`].
///
/// It tracks per-page state (empty/valid) and a per-block erase budget, and rejects writes to
/// already-valid pages and reads from empty pages exactly as the source device model does.
/// It does not model bus contention, per-die/per-plane concurrency, or timing: every event's
/// `time_taken` is left at `0`. Wear-leveling statistics beyond the raw counters below are out
/// of scope.
#[derive(Debug, Clone)]
pub struct InMemoryDevice {
    page_state: HashMap<(u32, u32, u32, u32, u32), PageState>,
    erases_remaining: HashMap<(u32, u32, u32, u32), u64>,
    block_erase_budget: u64,
    total_erases_performed: u64,
    total_writes_observed: u64,
}

impl InMemoryDevice {
    /// Create a device model in which every block starts with `block_erase_budget` erases
    /// remaining (the source's `BLOCK_ERASES` configuration value).
    #[must_use]
    pub fn new(block_erase_budget: u64) -> Self {
        Self {
            page_state: HashMap::new(),
            erases_remaining: HashMap::new(),
            block_erase_budget,
            total_erases_performed: 0,
            total_writes_observed: 0,
        }
    }

    fn block_key(addr: &Address) -> (u32, u32, u32, u32) {
        (addr.package, addr.die, addr.plane, addr.block)
    }

    fn page_key(addr: &Address) -> (u32, u32, u32, u32, u32) {
        (addr.package, addr.die, addr.plane, addr.block, addr.page)
    }

    fn state_of(&self, addr: &Address) -> PageState {
        *self
            .page_state
            .get(&Self::page_key(addr))
            .unwrap_or(&PageState::Empty)
    }

    fn erases_remaining_for(&self, addr: &Address) -> u64 {
        *self
            .erases_remaining
            .get(&Self::block_key(addr))
            .unwrap_or(&self.block_erase_budget)
    }

    /// Total number of block erases this device has successfully performed.
    #[must_use]
    pub fn total_erases_performed(&self) -> u64 {
        self.total_erases_performed
    }

    /// Total number of writes (including merges) this device has observed.
    #[must_use]
    pub fn total_writes_observed(&self) -> u64 {
        self.total_writes_observed
    }

    /// Erases remaining for the block containing `addr`.
    #[must_use]
    pub fn erases_remaining(&self, addr: &Address) -> u64 {
        self.erases_remaining_for(addr)
    }

    fn do_write(&mut self, addr: &Address) -> Result<(), ControllerError> {
        ensure!(
            self.state_of(addr) == PageState::Empty,
            PageAlreadyValidSnafu
        );
        self.page_state.insert(Self::page_key(addr), PageState::Valid);
        self.total_writes_observed += 1;
        Ok(())
    }

    fn do_read(&self, addr: &Address) -> Result<(), ControllerError> {
        ensure!(self.state_of(addr) != PageState::Empty, PageEmptySnafu);
        Ok(())
    }

    fn do_erase(&mut self, addr: &Address) -> Result<(), ControllerError> {
        let remaining = self.erases_remaining_for(addr);
        ensure!(remaining > 0, EraseBudgetExhaustedSnafu);

        let block_key = Self::block_key(addr);
        self.page_state
            .retain(|key, _| (key.0, key.1, key.2, key.3) != block_key);
        self.erases_remaining.insert(block_key, remaining - 1);
        self.total_erases_performed += 1;
        Ok(())
    }
}

impl Controller for InMemoryDevice {
    fn issue(&mut self, event: &mut Event) -> Result<(), ControllerError> {
        let addr = event
            .physical_address
            .expect("FTL must resolve a physical address before issuing an event");
        match event.kind {
            Kind::Read => self.do_read(&addr),
            Kind::Write | Kind::Merge => self.do_write(&addr),
            Kind::Erase => self.do_erase(&addr),
        }
    }
}

/// Generates the conformance suite every [`Controller`] implementation must pass: write then
/// read round-trips, and a write to an already-valid page is rejected.
///
/// Mirrors the teacher's `test_page_allocator!` macro, which does the same for every
/// `PageAllocator` implementation.
#[macro_export]
macro_rules! test_controller {
    ($impl_name:ident, $create:expr) => {
        paste::paste! {
            mod [<$impl_name:snake:lower _implements_controller>] {
                use $crate::controller::{Controller, ControllerError};
                use $crate::address::Address;
                use $crate::event::{Event, Kind};

                fn addr(block: u32, page: u32) -> Address {
                    Address::page(0, 0, 0, block, page)
                }

                #[test]
                fn write_then_read_round_trips() {
                    let mut dev = $create;
                    let mut w = Event::with_physical_address(Kind::Write, 0, addr(0, 0));
                    dev.issue(&mut w).unwrap();
                    let mut r = Event::with_physical_address(Kind::Read, 0, addr(0, 0));
                    dev.issue(&mut r).unwrap();
                }

                #[test]
                fn read_before_write_fails() {
                    let mut dev = $create;
                    let mut r = Event::with_physical_address(Kind::Read, 0, addr(0, 0));
                    assert_eq!(dev.issue(&mut r).unwrap_err(), ControllerError::PageEmpty);
                }

                #[test]
                fn double_write_without_erase_fails() {
                    let mut dev = $create;
                    let mut w1 = Event::with_physical_address(Kind::Write, 0, addr(0, 0));
                    dev.issue(&mut w1).unwrap();
                    let mut w2 = Event::with_physical_address(Kind::Write, 0, addr(0, 0));
                    assert_eq!(
                        dev.issue(&mut w2).unwrap_err(),
                        ControllerError::PageAlreadyValid
                    );
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn addr(block: u32, page: u32) -> Address {
        Address::page(0, 0, 0, block, page)
    }

    test_controller!(in_memory_device, InMemoryDevice::new(10));

    #[test]
    fn erase_resets_page_state_and_counts() {
        let mut dev = InMemoryDevice::new(10);
        let mut w = Event::with_physical_address(Kind::Write, 0, addr(0, 0));
        dev.issue(&mut w).unwrap();
        let mut e = Event::with_physical_address(Kind::Erase, 0, addr(0, 0));
        dev.issue(&mut e).unwrap();
        assert_eq!(dev.total_erases_performed(), 1);
        let mut w2 = Event::with_physical_address(Kind::Write, 0, addr(0, 0));
        dev.issue(&mut w2).unwrap();
    }

    #[test]
    fn erase_budget_exhaustion_is_rejected() {
        let mut dev = InMemoryDevice::new(1);
        let mut e1 = Event::with_physical_address(Kind::Erase, 0, addr(0, 0));
        dev.issue(&mut e1).unwrap();
        let mut e2 = Event::with_physical_address(Kind::Erase, 0, addr(0, 0));
        assert_eq!(
            dev.issue(&mut e2).unwrap_err(),
            ControllerError::EraseBudgetExhausted
        );
    }

    #[test]
    fn writes_observed_counts_merges_too() {
        let mut dev = InMemoryDevice::new(10);
        let mut m = Event::with_physical_address(Kind::Merge, 0, addr(0, 0));
        dev.issue(&mut m).unwrap();
        assert_eq!(dev.total_writes_observed(), 1);
    }
}

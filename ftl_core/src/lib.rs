//! Flash translation layer: logical-to-physical address translation, log-block indirection,
//! and garbage collection for a flash-storage simulator.
//!
//! This crate models the *core* of a flash translation layer — the part that sits between a
//! host addressing raw logical block addresses and a device controller that executes
//! single-page reads, writes, and erases. It keeps a data region the host can address
//! directly, a reservation of log blocks used to absorb rewrites without erasing on every
//! write, and a permanent cleaning block used to stage garbage collection.
//!
//! The device model, logging, and configuration loading in this crate and its companion
//! `ftl_sim` binary are deliberately minimal: this is a simulator core, not a production flash
//! controller.
#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod controller;
pub mod error;
pub mod event;
mod gc;
pub mod ftl;
pub mod geometry;
pub mod log_block;
pub mod logging;
pub mod page_status;
mod translator;

pub use address::Address;
pub use controller::{Controller, ControllerError, InMemoryDevice};
pub use error::Error;
pub use event::{Event, Kind};
pub use ftl::{Ftl, FtlConstructionError};
pub use geometry::{Derived, Geometry, InvalidGeometry};
pub use log_block::{LogBlockDirectory, LogBlockEntry};
pub use logging::{GlobalLogSink, LogSink};
pub use page_status::PageStatusTable;

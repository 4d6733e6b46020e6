//! The mutable state an executor needs beyond the request/device pair:
//! the diagnostic counters, the exception-status byte, and the slab that
//! backs transient response payloads. Bundled into one struct so handler
//! signatures don't grow a parameter every time a new function needs a
//! different slice of shared state.

#![allow(dead_code)]

use crate::counters::{Counters, ExceptionStatus};
use crate::slab::Slab;

/// Size of the slab region backing transient response payloads, per the
/// "2 KiB contiguous byte region" called out in the design.
pub const SLAB_SIZE: usize = 2048;

pub type ProtocolSlab = Slab<SLAB_SIZE>;

pub struct Runtime {
    pub counters: Counters,
    pub exception_status: ExceptionStatus,
    pub slab: ProtocolSlab,
}

impl Runtime {
    pub fn new() -> Self {
        let mut slab = ProtocolSlab::new();
        slab.init();
        Self {
            counters: Counters::new(),
            exception_status: ExceptionStatus::NONE,
            slab,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

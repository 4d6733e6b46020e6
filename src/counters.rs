//! The eight Modbus diagnostic counters, the exception-status byte, and the
//! busy flag that guards reentrant dispatch.

#![allow(dead_code)]

use core::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;

bitflags! {
    /// The single exception-status byte returned by FC 0x07. The standard
    /// leaves its bit meanings device-specific; this crate exposes them as
    /// flags instead of a bare `u8` so embedders can name what they set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExceptionStatus: u8 {
        const NONE          = 0b0000_0000;
        const BUS_OVERRUN   = 0b0000_0001;
        const COIL_FAULT    = 0b0000_0010;
        const REGISTER_FAULT = 0b0000_0100;
        const DEVICE_FAILURE = 0b0000_1000;
    }
}

/// The eight standard Modbus diagnostic counters (FC 0x08, sub-functions
/// 0x0B..0x12). All wrap on overflow; none of them gate behavior, they are
/// purely observational.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub bus_msg: u16,
    pub bus_com_err: u16,
    pub exc_err: u16,
    pub slave_msg: u16,
    pub slave_no_resp: u16,
    pub slave_nak: u16,
    pub slave_busy: u16,
    pub bus_char_overrun: u16,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            bus_msg: 0,
            bus_com_err: 0,
            exc_err: 0,
            slave_msg: 0,
            slave_no_resp: 0,
            slave_nak: 0,
            slave_busy: 0,
            bus_char_overrun: 0,
        }
    }

    /// Reset by `init` and by diagnostic sub-function 0x0A.
    pub fn clear_all(&mut self) {
        *self = Self::new();
    }

    /// Diagnostic sub-function 0x14: clears only the overrun counter.
    pub fn clear_overrun(&mut self) {
        self.bus_char_overrun = 0;
    }

    /// Lookup used by diagnostic sub-functions 0x0B..0x12.
    pub fn by_sub_function(&self, sub: u16) -> Option<u16> {
        match sub {
            0x0B => Some(self.bus_msg),
            0x0C => Some(self.bus_com_err),
            0x0D => Some(self.exc_err),
            0x0E => Some(self.slave_msg),
            0x0F => Some(self.slave_no_resp),
            0x10 => Some(self.slave_nak),
            0x11 => Some(self.slave_busy),
            0x12 => Some(self.bus_char_overrun),
            _ => None,
        }
    }
}

/// Reentrancy guard for `handle_request`. Backed by an `AtomicBool` rather
/// than a plain `bool` so a dispatch entered from an interrupt context
/// while another is in flight observes a consistent value; see the
/// concurrency notes in the crate's design doc for what this does and does
/// not protect against.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Attempt to transition `false -> true`. Returns `true` if this call
    /// won the race and should proceed; `false` if another dispatch already
    /// holds the flag.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

//! The request/response pipeline: validate framing, resolve a handler,
//! validate its address and data, execute it, and send (or suppress) the
//! reply. Grounded on the reference device's `mb_handle_request` — the
//! checkpoints here are the same checkpoints it walks through, reordered
//! into early returns instead of nested `if`s.

#![allow(dead_code)]

use crate::adu::{decode, encode, encode_exception};
use crate::byteorder::crc16;
use crate::counters::BusyFlag;
use crate::device::Device;
use crate::error::{ExceptionCode, FrameError};
use crate::registry::lookup;
use crate::runtime::Runtime;

pub const BROADCAST_ADDRESS: u8 = 0;

/// Why `handle_request` produced no reply on the wire. A dropped frame is
/// not an error from the caller's point of view — most causes (wrong
/// address, bad CRC, concurrent dispatch) are exactly what a multi-drop RTU
/// bus is expected to produce routinely.
#[cfg_attr(not(test), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Busy,
    Frame(FrameError),
    AddressMismatch,
    Broadcast,
}

#[cfg_attr(not(test), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A frame (response or exception) was handed to `Device::send`.
    Sent,
    Suppressed(SuppressReason),
}

struct BusyGuard<'a>(&'a BusyFlag);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Owns the device binding, the runtime state (counters, exception status,
/// slab) and the busy flag that guards reentrant dispatch. This is the
/// crate's one long-lived value; an embedder constructs it once at boot and
/// feeds it every inbound frame.
pub struct ServerState<'a> {
    pub device: Device<'a>,
    pub runtime: Runtime,
    busy: BusyFlag,
}

impl<'a> ServerState<'a> {
    pub fn new(device: Device<'a>) -> Self {
        Self { device, runtime: Runtime::new(), busy: BusyFlag::new() }
    }

    /// Process one inbound RTU frame (address byte through CRC, inclusive).
    /// Never panics on malformed input; every failure path either sends an
    /// exception frame or suppresses the reply, per the Modbus RTU contract.
    pub fn handle_request(&mut self, frame: &[u8]) -> DispatchOutcome {
        if !self.busy.try_acquire() {
            self.runtime.counters.slave_busy += 1;
            return DispatchOutcome::Suppressed(SuppressReason::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        if frame.len() < 3 {
            self.runtime.counters.bus_com_err += 1;
            return DispatchOutcome::Suppressed(SuppressReason::Frame(FrameError::TooShort));
        }

        let adu_result = decode(frame);
        let mut adu = match adu_result {
            Ok(adu) => adu,
            Err(e) => return DispatchOutcome::Suppressed(SuppressReason::Frame(e)),
        };

        let expected_crc = crc16(&frame[..frame.len() - 2]);
        if expected_crc != adu.crc {
            self.runtime.counters.bus_com_err += 1;
            return DispatchOutcome::Suppressed(SuppressReason::Frame(FrameError::CrcMismatch));
        }
        self.runtime.counters.bus_msg += 1;

        let broadcast = adu.address == BROADCAST_ADDRESS;
        if !broadcast && adu.address != self.device.address {
            return DispatchOutcome::Suppressed(SuppressReason::AddressMismatch);
        }
        self.runtime.counters.slave_msg += 1;

        let function = adu.function;
        let entry = lookup(function);

        // A broadcast read would build a response nobody is listening for;
        // reject it before `execute` runs instead of wasting a slab
        // allocation on an answer that goes nowhere.
        if broadcast && entry.is_some_and(|e| e.is_read) {
            self.runtime.counters.slave_no_resp += 1;
            return DispatchOutcome::Suppressed(SuppressReason::Broadcast);
        }

        let reply = match entry {
            None => Err(ExceptionCode::IllegalFunction),
            Some(entry) if !entry.supported => Err(ExceptionCode::IllegalFunction),
            Some(entry) if !(entry.check_addr)(&adu, &self.device) => Err(ExceptionCode::IllegalDataAddress),
            Some(entry) if !(entry.check_data)(&adu, &self.device) => Err(ExceptionCode::IllegalDataValue),
            Some(entry) => (entry.execute)(&mut adu, &mut self.device, &mut self.runtime),
        };

        let outcome = match reply {
            Ok(()) => {
                if broadcast {
                    self.runtime.counters.slave_no_resp += 1;
                    DispatchOutcome::Suppressed(SuppressReason::Broadcast)
                } else {
                    let out = encode(&adu, &self.runtime.slab);
                    self.device.send(&out);
                    DispatchOutcome::Sent
                }
            }
            Err(code) => {
                self.runtime.counters.exc_err += 1;
                if broadcast {
                    self.runtime.counters.slave_no_resp += 1;
                    DispatchOutcome::Suppressed(SuppressReason::Broadcast)
                } else {
                    let out = encode_exception(self.device.address, function, code.code());
                    self.device.send(&out);
                    DispatchOutcome::Sent
                }
            }
        };

        adu.payload.release(&mut self.runtime.slab);
        outcome
    }
}

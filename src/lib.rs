//! `no_std` Modbus RTU server core.
//!
//! The crate owns the protocol engine only: ADU framing, the function code
//! registry, the validate/execute pipeline, and the transient-allocation
//! slab the pipeline needs along the way. Transport (how bytes arrive from
//! and leave the RS-485 line) and application data (what a holding register
//! actually means) are the embedder's problem — this crate meets them at
//! `Device::send` and the four `BitMap`/`RegisterMap` backing slices.

#![cfg_attr(not(test), no_std)]

pub mod adu;
pub mod byteorder;
pub mod counters;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod functions;
pub mod registry;
pub mod runtime;
mod slab;

pub use adu::{Adu, Payload, MAX_ADU_LEN};
pub use counters::{BusyFlag, Counters, ExceptionStatus};
pub use device::{BitMap, Device, DeviceBuilder, RegisterMap};
pub use dispatcher::{DispatchOutcome, ServerState, SuppressReason};
pub use error::{ConfigError, ExceptionCode, FrameError};
pub use runtime::Runtime;
pub use slab::{Slab, SlabHandle};

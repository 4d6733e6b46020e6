//! The function code table: one row per Modbus function code this crate
//! knows about, naming whether it's supported and which check/execute
//! functions implement it. Grounded directly on the reference device's
//! `handlers[]` table, including the rows it carries for function codes it
//! declares but does not implement.

#![allow(dead_code)]

use crate::functions::{always_true, coils, diagnostics, misc, registers, unreachable_execute, CheckFn, ExecuteFn};

pub struct HandlerEntry {
    pub function_code: u8,
    pub supported: bool,
    /// True for function codes that only read device state back to the
    /// master. A broadcast frame naming one of these is rejected before
    /// `execute` runs, since nobody is listening for the answer — see
    /// `dispatcher::handle_request`.
    pub is_read: bool,
    pub check_addr: CheckFn,
    pub check_data: CheckFn,
    pub execute: ExecuteFn,
}

macro_rules! supported {
    ($fc:expr, $is_read:expr, $check_addr:expr, $check_data:expr, $execute:expr) => {
        HandlerEntry {
            function_code: $fc,
            supported: true,
            is_read: $is_read,
            check_addr: $check_addr,
            check_data: $check_data,
            execute: $execute,
        }
    };
}

macro_rules! unsupported {
    ($fc:expr) => {
        HandlerEntry {
            function_code: $fc,
            supported: false,
            is_read: false,
            check_addr: always_true,
            check_data: always_true,
            execute: unreachable_execute,
        }
    };
}

pub static HANDLERS: &[HandlerEntry] = &[
    supported!(0x01, true, coils::check_coils_address, coils::check_read_coils_data, coils::execute_read_coils),
    supported!(
        0x02,
        true,
        coils::check_discrete_input_address,
        coils::check_read_discrete_inputs_data,
        coils::execute_read_discrete_inputs
    ),
    supported!(
        0x03,
        true,
        registers::check_holding_registers_address,
        registers::check_read_holding_registers_data,
        registers::execute_read_holding_registers
    ),
    supported!(
        0x04,
        true,
        registers::check_input_registers_address,
        registers::check_read_input_registers_data,
        registers::execute_read_input_registers
    ),
    supported!(
        0x05,
        false,
        coils::check_coils_address,
        coils::check_write_single_coil_data,
        coils::execute_write_single_coil
    ),
    supported!(
        0x06,
        false,
        registers::check_write_single_register_data,
        always_true,
        registers::execute_write_single_register
    ),
    supported!(0x07, true, always_true, always_true, misc::execute_read_exception_status),
    // Diagnostics mixes read and write sub-functions; broadcast handling for
    // FC 0x08 isn't short-circuited by `is_read` (see dispatcher.rs).
    supported!(0x08, false, always_true, diagnostics::check_diagnostic_data, diagnostics::execute_diagnostics),
    supported!(
        0x0F,
        false,
        coils::check_coils_address,
        coils::check_write_multiple_coils_data,
        coils::execute_write_multiple_coils
    ),
    supported!(
        0x10,
        false,
        registers::check_holding_registers_address,
        registers::check_write_multiple_registers_data,
        registers::execute_write_multiple_registers
    ),
    supported!(0x11, true, always_true, always_true, misc::execute_report_device_id),
    supported!(
        0x16,
        false,
        registers::check_mask_write_register_data,
        always_true,
        registers::execute_mask_write_register
    ),
    // Declared but not implemented by this crate, matching the reference
    // device's handler table: the registry still carries the row so that
    // dispatch finds a `supported = false` entry and returns
    // `IllegalFunction` instead of falling through to "unknown function".
    unsupported!(0x14), // read file record
    unsupported!(0x15), // write file record
    unsupported!(0x17), // read/write multiple registers
    unsupported!(0x18), // read FIFO queue
    unsupported!(0x2B), // encapsulated interface transport
];

/// Linear scan over a table small enough (twenty rows at most) that a
/// binary search or hash lookup would just add indirection.
pub fn lookup(function_code: u8) -> Option<&'static HandlerEntry> {
    HANDLERS.iter().find(|entry| entry.function_code == function_code)
}

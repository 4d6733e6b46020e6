//! FC 0x08 (diagnostics). Unlike the other function codes, this one
//! multiplexes on a sub-function held in the first two payload bytes rather
//! than dispatching by function code alone, so its check/execute pair do
//! their own internal `match` on the sub-function instead of delegating to
//! the registry.

use crate::adu::Adu;
use crate::byteorder::u16_msb_read;
use crate::device::Device;
use crate::error::ExceptionCode;
use crate::runtime::Runtime;

const RETURN_QUERY_DATA: u16 = 0x00;
const RESTART_COMMUNICATIONS_OPTION: u16 = 0x01;
const CLEAR_COUNTERS_AND_DIAGNOSTIC_REGISTER: u16 = 0x0A;
const CLEAR_OVERRUN_COUNTER_AND_FLAG: u16 = 0x14;

fn is_counter_subfunction(sub: u16) -> bool {
    (0x0B..=0x12).contains(&sub)
}

/// Sub-functions the registry recognizes by name but doesn't implement:
/// return-diagnostic-register, change-ascii-delimiter, force-listen-only.
/// These pass `check_data` (they're well-formed requests for a real
/// sub-function) and fail at `execute` with illegal-function, rather than
/// failing `check_data` the way a genuinely unknown sub-function slot does.
fn is_recognized_but_unimplemented(sub: u16) -> bool {
    (0x02..=0x04).contains(&sub)
}

/// `check_addr` has nothing to validate for FC 0x08 — the sub-function
/// lives in the data, not an address field.
pub fn check_diagnostic_data(adu: &Adu, _device: &Device) -> bool {
    let req = adu.request_header();
    if req.len() < 2 {
        return false;
    }
    let sub = u16_msb_read(&req[0..2]);
    match sub {
        RESTART_COMMUNICATIONS_OPTION => {
            req.len() >= 4 && matches!(u16_msb_read(&req[2..4]), 0x0000 | 0xFF00)
        }
        RETURN_QUERY_DATA | CLEAR_COUNTERS_AND_DIAGNOSTIC_REGISTER | CLEAR_OVERRUN_COUNTER_AND_FLAG => true,
        sub => is_counter_subfunction(sub) || is_recognized_but_unimplemented(sub),
    }
}

pub fn execute_diagnostics(adu: &mut Adu, _device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let sub = u16_msb_read(&req[0..2]);

    match sub {
        RETURN_QUERY_DATA => {
            // Echo the request verbatim; nothing to build.
            Ok(())
        }
        RESTART_COMMUNICATIONS_OPTION => {
            rt.counters.clear_all();
            Ok(())
        }
        CLEAR_COUNTERS_AND_DIAGNOSTIC_REGISTER => {
            let header = [req[0], req[1]];
            rt.counters.clear_all();
            let out = adu.alloc_response(&mut rt.slab, 4)?;
            out[0..2].copy_from_slice(&header);
            out[2] = 0;
            out[3] = 0;
            Ok(())
        }
        CLEAR_OVERRUN_COUNTER_AND_FLAG => {
            let header = [req[0], req[1]];
            rt.counters.clear_overrun();
            let out = adu.alloc_response(&mut rt.slab, 4)?;
            out[0..2].copy_from_slice(&header);
            out[2] = 0;
            out[3] = 0;
            Ok(())
        }
        sub if is_counter_subfunction(sub) => {
            let header = [req[0], req[1]];
            let value = rt.counters.by_sub_function(sub).unwrap_or(0);
            let out = adu.alloc_response(&mut rt.slab, 4)?;
            out[0..2].copy_from_slice(&header);
            out[2] = (value >> 8) as u8;
            out[3] = (value & 0xFF) as u8;
            Ok(())
        }
        // Recognized but not implemented: return-diagnostic-register,
        // change-ascii-delimiter, force-listen-only-mode.
        sub if is_recognized_but_unimplemented(sub) => Err(ExceptionCode::IllegalFunction),
        _ => Err(ExceptionCode::IllegalFunction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adu::decode;
    use crate::device::{BitMap, DeviceBuilder, RegisterMap};

    fn make_device<'a>(
        di: &'a mut [u8],
        co: &'a mut [u8],
        ir: &'a mut [u16],
        hr: &'a mut [u16],
        send: &'a mut dyn FnMut(&[u8]),
    ) -> Device<'a> {
        DeviceBuilder::new(
            1,
            BitMap { start_addr: 0, end_addr: di.len() as u16, backing: di },
            BitMap { start_addr: 0, end_addr: co.len() as u16, backing: co },
            RegisterMap { start_addr: 0, end_addr: ir.len() as u16, backing: ir },
            RegisterMap { start_addr: 0, end_addr: hr.len() as u16, backing: hr },
            send,
        )
        .build()
        .unwrap()
    }

    #[test]
    fn restart_communications_option_clears_counters() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        let mut send = |_: &[u8]| {};
        let mut device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);
        let mut rt = Runtime::new();
        rt.counters.bus_msg = 42;

        let frame = [0x01u8, 0x08, 0x00, 0x01, 0xFF, 0x00, 0, 0];
        let mut adu = decode(&frame).unwrap();
        execute_diagnostics(&mut adu, &mut device, &mut rt).unwrap();
        assert_eq!(rt.counters.bus_msg, 0);
    }

    #[test]
    fn return_bus_message_count_reports_current_value() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        let mut send = |_: &[u8]| {};
        let mut device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);
        let mut rt = Runtime::new();
        rt.counters.bus_msg = 0x0102;

        let frame = [0x01u8, 0x08, 0x00, 0x0B, 0x00, 0x00, 0, 0];
        let mut adu = decode(&frame).unwrap();
        execute_diagnostics(&mut adu, &mut device, &mut rt).unwrap();
        let out = adu.payload.as_slice(&rt.slab);
        assert_eq!(out, &[0x00, 0x0B, 0x01, 0x02]);
    }

    #[test]
    fn restart_communications_option_rejects_bad_second_word() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        let mut send = |_: &[u8]| {};
        let device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);

        let frame = [0x01u8, 0x08, 0x00, 0x01, 0x12, 0x34, 0, 0];
        let adu = decode(&frame).unwrap();
        assert!(!check_diagnostic_data(&adu, &device));
    }

    #[test]
    fn recognized_but_unimplemented_subfunction_passes_check_but_fails_execute() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        let mut send = |_: &[u8]| {};
        let mut device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);
        let mut rt = Runtime::new();

        let frame = [0x01u8, 0x08, 0x00, 0x02, 0x00, 0x00, 0, 0];
        let adu = decode(&frame).unwrap();
        assert!(check_diagnostic_data(&adu, &device));
        let mut adu = decode(&frame).unwrap();
        assert_eq!(
            execute_diagnostics(&mut adu, &mut device, &mut rt).unwrap_err(),
            ExceptionCode::IllegalFunction
        );
    }

    #[test]
    fn unknown_sub_function_fails_the_data_check() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        let mut send = |_: &[u8]| {};
        let device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);

        let frame = [0x01u8, 0x08, 0x00, 0x99, 0x00, 0x00, 0, 0];
        let adu = decode(&frame).unwrap();
        assert!(!check_diagnostic_data(&adu, &device));
    }
}

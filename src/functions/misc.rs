//! FC 0x07 (read exception status), FC 0x11 (report device id). Neither
//! function carries an address or a meaningful request body, so their
//! checks are trivially satisfied and the registry's `always_true` stands
//! in for both `check_addr` and `check_data`.

use crate::adu::Adu;
use crate::device::Device;
use crate::error::ExceptionCode;
use crate::runtime::Runtime;

pub fn execute_read_exception_status(adu: &mut Adu, _device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let out = adu.alloc_response(&mut rt.slab, 1)?;
    out[0] = rt.exception_status.bits();
    Ok(())
}

pub fn execute_report_device_id(adu: &mut Adu, device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let out = adu.alloc_response(&mut rt.slab, 2)?;
    out[0] = device.address;
    out[1] = 0xFF;
    Ok(())
}

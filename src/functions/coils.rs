//! FC 0x01/0x02 (read coils/discrete inputs), FC 0x05 (write single coil),
//! FC 0x0F (write multiple coils).

use crate::adu::Adu;
use crate::byteorder::{nearest_multiple_of_8, u16_msb_read, u16_msb_write};
use crate::device::Device;
use crate::error::ExceptionCode;
use crate::runtime::Runtime;

const COIL_ON: u16 = 0xFF00;
const COIL_OFF: u16 = 0x0000;

pub fn check_discrete_input_address(adu: &Adu, device: &Device) -> bool {
    let addr = u16_msb_read(adu.request_header());
    device.discrete_inputs.contains_byte(addr / 8)
}

pub fn check_coils_address(adu: &Adu, device: &Device) -> bool {
    let addr = u16_msb_read(adu.request_header());
    device.coils.contains_byte(addr / 8)
}

fn check_read_bits_data(adu: &Adu, start: u16, end: u16) -> bool {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let quantity = u16_msb_read(&req[2..4]);
    let block_bytes = nearest_multiple_of_8(quantity) / 8;
    (1..=0x07D0).contains(&quantity) && address / 8 >= start && block_bytes + address / 8 < end
}

pub fn check_read_discrete_inputs_data(adu: &Adu, device: &Device) -> bool {
    check_read_bits_data(adu, device.discrete_inputs.start_addr, device.discrete_inputs.end_addr)
}

pub fn check_read_coils_data(adu: &Adu, device: &Device) -> bool {
    check_read_bits_data(adu, device.coils.start_addr, device.coils.end_addr)
}

pub fn check_write_single_coil_data(adu: &Adu, device: &Device) -> bool {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let state = u16_msb_read(&req[2..4]);
    (state == COIL_OFF || state == COIL_ON) && device.coils.contains_byte(address / 8)
}

pub fn check_write_multiple_coils_data(adu: &Adu, device: &Device) -> bool {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let quantity = u16_msb_read(&req[2..4]);
    let byte_count = req[4] as u16;
    (1..=0x07D0).contains(&quantity)
        && byte_count == nearest_multiple_of_8(quantity) / 8
        && address / 8 >= device.coils.start_addr
        && address / 8 + byte_count < device.coils.end_addr
}

/// Shared by FC 0x01 and 0x02. Reproduces the reference device's shift
/// accumulation: the backing bitmap is MSB-first within each byte, and the
/// first requested bit ends up in bit 7 of the output byte after eight
/// right-shifts.
fn read_bits(adu: &mut Adu, backing: &[u8], rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let quantity = u16_msb_read(&req[2..4]);
    let byte_count = (nearest_multiple_of_8(quantity) / 8) as usize;

    let mut rbn = (address / 8) as usize;
    let mut rshift = (address % 8) as u8;
    let mut bytes = [0u8; 252];
    for slot in bytes[..byte_count].iter_mut() {
        let mut acc = 0u8;
        for _ in 0..8 {
            acc >>= 1;
            if backing[rbn] & (0x80 >> rshift) != 0 {
                acc |= 0x80;
            }
            rshift += 1;
            if rshift == 8 {
                rshift = 0;
                rbn += 1;
            }
        }
        *slot = acc;
    }

    let out = adu.alloc_response(&mut rt.slab, byte_count + 1)?;
    out[0] = byte_count as u8;
    out[1..].copy_from_slice(&bytes[..byte_count]);
    Ok(())
}

pub fn execute_read_discrete_inputs(adu: &mut Adu, device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    read_bits(adu, device.discrete_inputs.backing, rt)
}

pub fn execute_read_coils(adu: &mut Adu, device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    read_bits(adu, device.coils.backing, rt)
}

pub fn execute_write_single_coil(adu: &mut Adu, device: &mut Device, _rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let state = u16_msb_read(&req[2..4]);
    let byte = (address / 8) as usize;
    let mask = 0x80u8 >> (address % 8);
    if state == COIL_ON {
        device.coils.backing[byte] |= mask;
    } else {
        device.coils.backing[byte] &= !mask;
    }
    // Response echoes the request verbatim; nothing further to build.
    Ok(())
}

pub fn execute_write_multiple_coils(adu: &mut Adu, device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let quantity = u16_msb_read(&req[2..4]);
    let byte_count = req[4] as usize;

    let mut ba = (address / 8) as usize;
    let mut shift = address % 8;
    let mut remaining = quantity;
    for i in 0..byte_count {
        let mut byte = req[5 + i];
        for _ in 0..8 {
            if remaining == 0 {
                break;
            }
            let mask = 0x80u8 >> shift;
            if byte & 0x01 != 0 {
                device.coils.backing[ba] |= mask;
            } else {
                device.coils.backing[ba] &= !mask;
            }
            byte >>= 1;
            remaining -= 1;
            shift += 1;
            if shift == 8 {
                shift = 0;
                ba += 1;
            }
        }
    }

    let out = adu.alloc_response(&mut rt.slab, 4)?;
    u16_msb_write(address, &mut out[0..2]);
    u16_msb_write(quantity, &mut out[2..4]);
    Ok(())
}

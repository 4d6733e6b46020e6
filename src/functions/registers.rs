//! FC 0x03/0x04 (read holding/input registers), FC 0x06 (write single
//! register), FC 0x10 (write multiple registers), FC 0x16 (mask write
//! register).

use crate::adu::Adu;
use crate::byteorder::{u16_msb_read, u16_msb_write};
use crate::device::Device;
use crate::error::ExceptionCode;
use crate::runtime::Runtime;

pub fn check_holding_registers_address(adu: &Adu, device: &Device) -> bool {
    let addr = u16_msb_read(adu.request_header());
    device.holding_registers.contains(addr)
}

pub fn check_input_registers_address(adu: &Adu, device: &Device) -> bool {
    let addr = u16_msb_read(adu.request_header());
    device.input_registers.contains(addr)
}

fn check_read_registers_data(adu: &Adu, start: u16, end: u16) -> bool {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let quantity = u16_msb_read(&req[2..4]);
    (1..=0x007D).contains(&quantity) && address >= start && address + quantity < end
}

pub fn check_read_holding_registers_data(adu: &Adu, device: &Device) -> bool {
    check_read_registers_data(adu, device.holding_registers.start_addr, device.holding_registers.end_addr)
}

pub fn check_read_input_registers_data(adu: &Adu, device: &Device) -> bool {
    check_read_registers_data(adu, device.input_registers.start_addr, device.input_registers.end_addr)
}

pub fn check_write_single_register_data(adu: &Adu, device: &Device) -> bool {
    let addr = u16_msb_read(adu.request_header());
    device.holding_registers.contains(addr)
}

pub fn check_write_multiple_registers_data(adu: &Adu, device: &Device) -> bool {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]);
    let quantity = u16_msb_read(&req[2..4]);
    let byte_count = req[4] as u16;
    (1..=0x0079).contains(&quantity)
        && byte_count == quantity * 2
        && address >= device.holding_registers.start_addr
        && address + quantity < device.holding_registers.end_addr
}

pub fn check_mask_write_register_data(adu: &Adu, device: &Device) -> bool {
    let addr = u16_msb_read(adu.request_header());
    device.holding_registers.contains(addr)
}

/// Shared by FC 0x03 and 0x04.
fn read_registers(adu: &mut Adu, backing: &[u16], rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]) as usize;
    let quantity = u16_msb_read(&req[2..4]) as usize;

    let out = adu.alloc_response(&mut rt.slab, 1 + quantity * 2)?;
    out[0] = (quantity * 2) as u8;
    for (i, reg) in backing[address..address + quantity].iter().enumerate() {
        u16_msb_write(*reg, &mut out[1 + i * 2..3 + i * 2]);
    }
    Ok(())
}

pub fn execute_read_holding_registers(adu: &mut Adu, device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    read_registers(adu, device.holding_registers.backing, rt)
}

pub fn execute_read_input_registers(adu: &mut Adu, device: &mut Device, rt: &mut Runtime) -> Result<(), ExceptionCode> {
    read_registers(adu, device.input_registers.backing, rt)
}

pub fn execute_write_single_register(adu: &mut Adu, device: &mut Device, _rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]) as usize;
    let value = u16_msb_read(&req[2..4]);
    device.holding_registers.backing[address] = value;
    // Response echoes the request verbatim.
    Ok(())
}

/// The reference firmware copies the request bytes into register storage
/// with a raw `memcpy`, which on a little-endian host stores each register
/// byte-swapped relative to the MSB-first wire format it reads back with.
/// This reimplementation decodes each word explicitly instead, so a register
/// written here and later read back with FC 0x03 round-trips correctly.
pub fn execute_write_multiple_registers(adu: &mut Adu, device: &mut Device, _rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]) as usize;
    let quantity = u16_msb_read(&req[2..4]) as usize;
    for i in 0..quantity {
        let value = u16_msb_read(&req[5 + i * 2..7 + i * 2]);
        device.holding_registers.backing[address + i] = value;
    }
    // Response echoes address/quantity, which are already the first four
    // request bytes — nothing further to build.
    Ok(())
}

/// `result = (current AND and_mask) OR (or_mask AND NOT and_mask)`.
pub fn execute_mask_write_register(adu: &mut Adu, device: &mut Device, _rt: &mut Runtime) -> Result<(), ExceptionCode> {
    let req = adu.request_header();
    let address = u16_msb_read(&req[0..2]) as usize;
    let and_mask = u16_msb_read(&req[2..4]);
    let or_mask = u16_msb_read(&req[4..6]);
    let current = device.holding_registers.backing[address];
    device.holding_registers.backing[address] = (current & and_mask) | (or_mask & !and_mask);
    Ok(())
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
    fn read_holding_registers_packs_msb_first() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        hr[0] = 0x1234;
        hr[1] = 0xABCD;
        let mut send = |_: &[u8]| {};
        let mut device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);
        let mut rt = Runtime::new();

        let frame = [0x01u8, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B];
        let mut adu = decode(&frame).unwrap();
        execute_read_holding_registers(&mut adu, &mut device, &mut rt).unwrap();
        let out = adu.payload.as_slice(&rt.slab);
        assert_eq!(out, &[0x04, 0x12, 0x34, 0xAB, 0xCD]);
    }

    #[test]
    fn write_multiple_registers_round_trips_through_read() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        let mut send = |_: &[u8]| {};
        let mut device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);
        let mut rt = Runtime::new();

        // FC 0x10, address 0, quantity 2, byte_count 4, values 0x1234 0xABCD.
        let frame = [0x11u8, 0x10, 0x00, 0x00, 0x00, 0x02, 0x04, 0x12, 0x34, 0xAB, 0xCD, 0, 0];
        let mut adu = decode(&frame).unwrap();
        execute_write_multiple_registers(&mut adu, &mut device, &mut rt).unwrap();
        assert_eq!(device.holding_registers.backing[0], 0x1234);
        assert_eq!(device.holding_registers.backing[1], 0xABCD);
    }

    #[test]
    fn mask_write_register_applies_documented_formula() {
        let mut di = [0u8; 8];
        let mut co = [0u8; 8];
        let mut ir = [0u16; 8];
        let mut hr = [0u16; 8];
        hr[0] = 0x0012;
        let mut send = |_: &[u8]| {};
        let mut device = make_device(&mut di, &mut co, &mut ir, &mut hr, &mut send);
        let mut rt = Runtime::new();

        let frame = [0x11u8, 0x16, 0x00, 0x00, 0x00, 0xF2, 0x00, 0x25, 0, 0];
        let mut adu = decode(&frame).unwrap();
        execute_mask_write_register(&mut adu, &mut device, &mut rt).unwrap();
        assert_eq!(device.holding_registers.backing[0], 0x0017);
    }
}

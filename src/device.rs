//! Device binding: the slave id, the four address-map views, and the send
//! callback. A `Device` is built once (validated at construction time) and
//! lives for as long as the `ServerState` that owns it.

#![allow(dead_code)]

use crate::error::ConfigError;

/// A contiguous bit-addressed window over caller-owned backing storage.
/// Bit `a` lives at byte `a / 8`, mask `0x80 >> (a % 8)` (MSB-first).
pub struct BitMap<'a> {
    pub start_addr: u16,
    pub end_addr: u16,
    pub backing: &'a mut [u8],
}

impl<'a> BitMap<'a> {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.start_addr >= self.end_addr {
            return Err(ConfigError::BitMapEmptyOrInverted);
        }
        if self.end_addr as usize > self.backing.len() {
            return Err(ConfigError::BitMapExceedsBacking);
        }
        Ok(())
    }

    pub fn contains_byte(&self, byte_addr: u16) -> bool {
        byte_addr >= self.start_addr && byte_addr < self.end_addr
    }
}

/// A contiguous word-addressed window over caller-owned backing storage.
/// Register `a` is the 16-bit word at index `a`.
pub struct RegisterMap<'a> {
    pub start_addr: u16,
    pub end_addr: u16,
    pub backing: &'a mut [u16],
}

impl<'a> RegisterMap<'a> {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.start_addr >= self.end_addr {
            return Err(ConfigError::RegisterMapEmptyOrInverted);
        }
        if self.end_addr as usize > self.backing.len() {
            return Err(ConfigError::RegisterMapExceedsBacking);
        }
        Ok(())
    }

    pub fn contains(&self, addr: u16) -> bool {
        addr >= self.start_addr && addr < self.end_addr
    }
}

/// The one logical Modbus server this crate binds to: its slave id, its
/// four address maps, and the callback used to emit a response frame.
pub struct Device<'a> {
    pub address: u8,
    pub discrete_inputs: BitMap<'a>,
    pub coils: BitMap<'a>,
    pub input_registers: RegisterMap<'a>,
    pub holding_registers: RegisterMap<'a>,
    send: &'a mut dyn FnMut(&[u8]),
}

impl<'a> core::fmt::Debug for Device<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl<'a> Device<'a> {
    pub fn send(&mut self, frame: &[u8]) {
        (self.send)(frame);
    }
}

/// Validating constructor for `Device`. Construction is the one place in
/// this crate allowed to reject bad input with an `Err` instead of trusting
/// the caller, since it runs once at boot rather than once per frame.
pub struct DeviceBuilder<'a> {
    address: u8,
    discrete_inputs: BitMap<'a>,
    coils: BitMap<'a>,
    input_registers: RegisterMap<'a>,
    holding_registers: RegisterMap<'a>,
    send: &'a mut dyn FnMut(&[u8]),
}

impl<'a> DeviceBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: u8,
        discrete_inputs: BitMap<'a>,
        coils: BitMap<'a>,
        input_registers: RegisterMap<'a>,
        holding_registers: RegisterMap<'a>,
        send: &'a mut dyn FnMut(&[u8]),
    ) -> Self {
        Self {
            address,
            discrete_inputs,
            coils,
            input_registers,
            holding_registers,
            send,
        }
    }

    pub fn build(self) -> Result<Device<'a>, ConfigError> {
        if self.address < 1 || self.address > 247 {
            return Err(ConfigError::SlaveAddressOutOfRange);
        }
        self.discrete_inputs.validate()?;
        self.coils.validate()?;
        self.input_registers.validate()?;
        self.holding_registers.validate()?;

        Ok(Device {
            address: self.address,
            discrete_inputs: self.discrete_inputs,
            coils: self.coils,
            input_registers: self.input_registers,
            holding_registers: self.holding_registers,
            send: self.send,
        })
    }
}

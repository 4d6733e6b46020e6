//! ADU (Application Data Unit) codec: `address | function | payload | crc`.

#![allow(dead_code)]

use heapless::Vec;

use crate::byteorder::{crc16, u16_lsb_read, u16_lsb_write};
use crate::error::{ExceptionCode, FrameError};
use crate::slab::{Slab, SlabHandle};

/// Maximum RTU frame size (address + function + 252 data bytes + CRC).
pub const MAX_ADU_LEN: usize = 256;

/// A decoded request or response payload. Borrowed while it still points
/// into the inbound buffer; becomes `Owned` the moment a handler replaces it
/// with a freshly built response, allocated out of the runtime's slab. Only
/// the `Owned` case needs releasing back to the slab once the frame is sent.
pub enum Payload<'a> {
    Borrowed(&'a [u8]),
    Owned { handle: SlabHandle, len: usize },
}

impl<'a> Payload<'a> {
    pub fn len(&self) -> usize {
        match self {
            Payload::Borrowed(s) => s.len(),
            Payload::Owned { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve to a byte slice. Needs the slab to look up `Owned` payloads;
    /// `Borrowed` payloads ignore it entirely.
    pub fn as_slice<'s, const N: usize>(&'s self, slab: &'s Slab<N>) -> &'s [u8] {
        match self {
            Payload::Borrowed(s) => s,
            Payload::Owned { handle, len } => slab.payload(*handle, *len),
        }
    }

    /// Release the slab allocation backing an `Owned` payload. A no-op for
    /// `Borrowed`. Called once by the dispatcher after a response is sent.
    pub fn release<const N: usize>(&self, slab: &mut Slab<N>) {
        if let Payload::Owned { handle, .. } = self {
            slab.free(*handle);
        }
    }
}

/// A decoded ADU. `payload` starts out borrowed from the inbound frame and
/// is overwritten by a handler's execute step with an owned, slab-backed
/// response.
pub struct Adu<'a> {
    pub address: u8,
    pub function: u8,
    pub payload: Payload<'a>,
    pub crc: u16,
}

impl<'a> Adu<'a> {
    /// The original request bytes (address/function stripped). Only valid
    /// while `payload` is still `Borrowed` — checks and the early part of
    /// an executor run before the payload is replaced with a response, so
    /// this is always safe to call from `CheckFn`s and from an `ExecuteFn`
    /// before it writes its own response.
    pub fn request_header(&self) -> &[u8] {
        match &self.payload {
            Payload::Borrowed(s) => s,
            Payload::Owned { .. } => unreachable!("request_header called after the response was built"),
        }
    }

    /// Allocate `len` bytes from `slab` and install them as this ADU's
    /// (owned) payload, handing back a mutable view to fill in. Maps slab
    /// exhaustion to the one exception code the protocol has no room to
    /// argue about.
    pub fn alloc_response<'s, const N: usize>(
        &mut self,
        slab: &'s mut Slab<N>,
        len: usize,
    ) -> Result<&'s mut [u8], ExceptionCode> {
        let handle = slab.alloc(len).ok_or(ExceptionCode::HeapError)?;
        self.payload = Payload::Owned { handle, len };
        Ok(slab.payload_mut(handle, len))
    }
}

/// Parse a candidate frame. Fails only on structural grounds (too short);
/// the CRC itself is re-derivable from the parsed fields by the caller, who
/// checks it before bothering to decode at all (see `dispatcher`).
pub fn decode(buf: &[u8]) -> Result<Adu<'_>, FrameError> {
    if buf.len() < 4 {
        return Err(FrameError::TooShort);
    }
    let crc = u16_lsb_read(&buf[buf.len() - 2..]);
    Ok(Adu {
        address: buf[0],
        function: buf[1],
        payload: Payload::Borrowed(&buf[2..buf.len() - 2]),
        crc,
    })
}

/// Serialize an ADU back to wire bytes, recomputing the CRC over the
/// address/function/payload it was just given.
pub fn encode<const N: usize>(adu: &Adu<'_>, slab: &Slab<N>) -> Vec<u8, MAX_ADU_LEN> {
    let mut out: Vec<u8, MAX_ADU_LEN> = Vec::new();
    out.push(adu.address).ok();
    out.push(adu.function).ok();
    out.extend_from_slice(adu.payload.as_slice(slab)).ok();
    let crc = crc16(&out);
    let mut crc_bytes = [0u8; 2];
    u16_lsb_write(crc, &mut crc_bytes);
    out.extend_from_slice(&crc_bytes).ok();
    out
}

/// Build the fixed five-byte exception frame directly, without going
/// through `Adu`/the allocator — this is the one frame the dispatcher must
/// be able to produce even when the slab is exhausted.
pub fn encode_exception(address: u8, function: u8, code: u8) -> [u8; 5] {
    let mut frame = [address, function | 0x80, code, 0, 0];
    let crc = crc16(&frame[..3]);
    u16_lsb_write(crc, &mut frame[3..5]);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn decode_rejects_short_frames() {
        assert!(matches!(decode(&[0x01, 0x03, 0x00]), Err(FrameError::TooShort)));
    }

    #[test]
    fn decode_then_encode_roundtrips_unmodified_payload() {
        let frame = [0x01u8, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B];
        let adu = decode(&frame).unwrap();
        let rt = Runtime::new();
        let out = encode(&adu, &rt.slab);
        assert_eq!(out.as_slice(), &frame);
    }

    #[test]
    fn encode_exception_matches_spec_example() {
        // device 1, function 0x17 unsupported -> illegal function.
        let frame = encode_exception(0x01, 0x17, 0x01);
        assert_eq!(&frame[..3], &[0x01, 0x97, 0x01]);
    }

    #[test]
    fn alloc_response_replaces_payload_with_owned_slab_bytes() {
        let frame = [0x01u8, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B];
        let mut adu = decode(&frame).unwrap();
        let mut rt = Runtime::new();
        {
            let out = adu.alloc_response(&mut rt.slab, 3).unwrap();
            out.copy_from_slice(&[0xAA, 0xBB, 0xCC]);
        }
        assert_eq!(adu.payload.as_slice(&rt.slab), &[0xAA, 0xBB, 0xCC]);
        adu.payload.release(&mut rt.slab);
        assert!(rt.slab.is_fully_reclaimed());
    }
}

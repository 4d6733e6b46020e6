//! 16-bit stream helpers and the Modbus CRC-16.
//!
//! Modbus puts register values on the wire MSB-first but the frame CRC
//! LSB-first; keeping the two read/write pairs distinct (rather than one
//! generic "endianness" parameter) mirrors the protocol text and avoids a
//! whole class of swapped-argument bugs at the call sites.

/// Read a big-endian (`MSB..LSB`) `u16` from the front of `p`.
pub fn u16_msb_read(p: &[u8]) -> u16 {
    (p[0] as u16) << 8 | p[1] as u16
}

/// Read a little-endian (`LSB..MSB`) `u16` from the front of `p`.
pub fn u16_lsb_read(p: &[u8]) -> u16 {
    p[0] as u16 | (p[1] as u16) << 8
}

/// Write `val` big-endian into the front of `p`.
pub fn u16_msb_write(val: u16, p: &mut [u8]) {
    p[0] = (val >> 8) as u8;
    p[1] = (val & 0x00FF) as u8;
}

/// Write `val` little-endian into the front of `p`.
pub fn u16_lsb_write(val: u16, p: &mut [u8]) {
    p[0] = (val & 0x00FF) as u8;
    p[1] = (val >> 8) as u8;
}

/// Modbus CRC-16: polynomial 0xA001, init 0xFFFF, reflected in/out.
pub fn crc16(bytes: &[u8]) -> u16 {
    crc16::State::<crc16::MODBUS>::calculate(bytes)
}

/// `ceil(qty / 8) * 8`, the bit count rounded up to a whole number of bytes.
pub const fn nearest_multiple_of_8(val: u16) -> u16 {
    (val + 7) & !7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_read_write_roundtrip() {
        let mut buf = [0u8; 2];
        u16_msb_write(0x1234, &mut buf);
        assert_eq!(buf, [0x12, 0x34]);
        assert_eq!(u16_msb_read(&buf), 0x1234);
    }

    #[test]
    fn lsb_read_write_roundtrip() {
        let mut buf = [0u8; 2];
        u16_lsb_write(0x1234, &mut buf);
        assert_eq!(buf, [0x34, 0x12]);
        assert_eq!(u16_lsb_read(&buf), 0x1234);
    }

    #[test]
    fn crc_matches_known_vectors() {
        // From the Modbus spec's worked example.
        assert_eq!(crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]), 0xCDC5);
        assert_eq!(crc16(&[0x11, 0x03, 0x00, 0x6B, 0x00, 0x03]), 0x8776);
    }

    #[test]
    fn nearest_multiple_of_8_rounds_up() {
        assert_eq!(nearest_multiple_of_8(0), 0);
        assert_eq!(nearest_multiple_of_8(1), 8);
        assert_eq!(nearest_multiple_of_8(8), 8);
        assert_eq!(nearest_multiple_of_8(9), 16);
        assert_eq!(nearest_multiple_of_8(2000), 2000);
    }
}

//! Compact-u16 ("shortvec") length prefixes.
//!
//! Seven bits per byte, least significant group first, high bit set on every
//! byte except the last. At most three bytes.

/// Append the compact encoding of `value` to `out`.
pub fn encode_len(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

/// Decode a compact-u16 from the front of `bytes`, returning the value and
/// the number of bytes consumed.
pub fn decode_len(bytes: &[u8]) -> Option<(u16, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in bytes.iter().take(3).enumerate() {
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value).ok().map(|v| (v, i + 1));
        }
    }
    None
}

//! LEB128-style variable length integers: seven bits per byte, low bits first, the MSB
//! set on every byte except the last.

pub fn encode_varint(mut value: u64, bytes: &mut Vec<u8>) {
    while value >= 0x80 {
        bytes.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }

    bytes.push(value as u8);
}

/// Decodes one value, returning `None` on truncated input or when the value does not
/// fit into 64 bits.
pub fn decode_varint(iter: &mut std::slice::Iter<u8>) -> Option<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = *iter.next()?;
        let bits = (byte & 0x7F) as u64;

        if shift >= 64 || (shift == 63 && bits > 1) {
            return None;
        }

        result |= bits << shift;

        if byte & 0x80 == 0 {
            break;
        }

        shift += 7;
    }

    Some(result)
}

//! Base64 VLQ as used by the source map v3 `mappings` field.

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const SHIFT: u32 = 5;
const CONTINUATION: i64 = 1 << SHIFT;
const MASK: i64 = CONTINUATION - 1;

/// Encode one signed value.
pub fn encode(value: i64) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}

pub fn encode_into(value: i64, out: &mut String) {
    // Sign goes into the lowest bit.
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };

    loop {
        let mut digit = vlq & MASK;
        vlq >>= SHIFT;
        if vlq > 0 {
            digit |= CONTINUATION;
        }
        out.push(BASE64[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Decode the value at the start of `input`. Returns the value and the number
/// of bytes consumed, or `None` on an invalid digit or truncated input.
pub fn decode(input: &str) -> Option<(i64, usize)> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    for (i, byte) in input.bytes().enumerate() {
        let digit = base64_value(byte)? as i64;
        if shift > 60 {
            return None;
        }
        result |= (digit & MASK) << shift;
        shift += SHIFT;

        if digit & CONTINUATION == 0 {
            let negative = result & 1 == 1;
            let magnitude = result >> 1;
            let value = if negative { -magnitude } else { magnitude };
            return Some((value, i + 1));
        }
    }

    None
}

fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

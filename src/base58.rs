//! Base58 (Bitcoin/Solana alphabet) encoder, hand-rolled so the exact same
//! implementation backs both the CPU reference kernel and `gpu/kernel.wgsl`
//! (no crate is reachable from inside a GPU shader). Alphabet cross-checked
//! against `examples/other_examples/d7a4ecce_FeelsDEX-feels__vanity-miner-wasm-src-lib.rs.rs`.
//!
//! Host-side verification of kernel/CPU output uses the `bs58` crate instead
//! (see `driver::verify`) as an independent reference implementation.

pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Maximum encoded length of a 32-byte input: ceil(32 * log(256) / log(58)).
pub const MAX_ENCODED_LEN: usize = 44;

/// Encode a 32-byte big-endian value as Base58.
pub fn encode(input: &[u8; 32]) -> [u8; MAX_ENCODED_LEN] {
    let (out, _len) = encode_len(input);
    out
}

/// Same as [`encode`] but also returns the number of significant characters
/// (the rest of the fixed-size buffer is left as `0u8` padding).
pub fn encode_len(input: &[u8; 32]) -> ([u8; MAX_ENCODED_LEN], usize) {
    let zeros = input.iter().take_while(|&&b| b == 0).count();

    // Long division of the big-endian integer by 58, repeatedly, producing
    // base-58 digits least-significant first.
    let mut digits = [0u8; MAX_ENCODED_LEN];
    let mut digit_len = 0usize;

    let mut num = input.to_vec();
    let mut start = zeros;
    while start < num.len() {
        let mut remainder: u32 = 0;
        for i in start..num.len() {
            let acc = (remainder << 8) + num[i] as u32;
            num[i] = (acc / 58) as u8;
            remainder = acc % 58;
        }
        digits[digit_len] = remainder as u8;
        digit_len += 1;
        while start < num.len() && num[start] == 0 {
            start += 1;
        }
    }

    let mut out = [0u8; MAX_ENCODED_LEN];
    let mut pos = 0usize;
    for _ in 0..zeros {
        out[pos] = ALPHABET[0];
        pos += 1;
    }
    for i in (0..digit_len).rev() {
        out[pos] = ALPHABET[digits[i] as usize];
        pos += 1;
    }

    (out, pos)
}

/// Encode into a `String`, trimming the fixed-size buffer's padding.
pub fn encode_string(input: &[u8; 32]) -> String {
    let (buf, len) = encode_len(input);
    String::from_utf8(buf[..len].to_vec()).expect("base58 alphabet is ASCII")
}

/// Decode a Base58 string back into a 32-byte big-endian value. Returns
/// `None` if the string contains characters outside the alphabet or decodes
/// to more than 32 bytes.
pub fn decode(s: &str) -> Option<[u8; 32]> {
    let mut bytes = vec![0u8; 0];
    let zeros = s.bytes().take_while(|&b| b == ALPHABET[0]).count();

    for ch in s.bytes() {
        let digit = ALPHABET.iter().position(|&a| a == ch)? as u32;
        let mut carry = digit;
        for b in bytes.iter_mut() {
            carry += (*b as u32) * 58;
            *b = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    bytes.reverse();
    let mut full = vec![0u8; zeros];
    full.extend_from_slice(&bytes);
    if full.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - full.len()..].copy_from_slice(&full);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_random_looking_input() {
        let mut input = [0u8; 32];
        for (i, b) in input.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        let s = encode_string(&input);
        assert_eq!(decode(&s).unwrap(), input);
    }

    #[test]
    fn leading_zero_bytes_become_leading_ones() {
        let mut input = [5u8; 32];
        input[0] = 0;
        input[1] = 0;
        let s = encode_string(&input);
        assert!(s.starts_with("11"));
        assert!(!s.starts_with("111"));
    }

    #[test]
    fn all_zero_input_is_all_ones() {
        let input = [0u8; 32];
        let s = encode_string(&input);
        assert_eq!(s, "1".repeat(32));
    }

    #[test]
    fn alphabet_excludes_ambiguous_chars() {
        for bad in [b'0', b'O', b'I', b'l'] {
            assert!(!ALPHABET.contains(&bad));
        }
        assert_eq!(ALPHABET.len(), 58);
    }

    #[test]
    fn decode_rejects_invalid_chars() {
        assert!(decode("0").is_none());
        assert!(decode("abc0def").is_none());
    }

    #[test]
    fn encoded_length_is_bounded() {
        let input = [0xffu8; 32];
        let (_buf, len) = encode_len(&input);
        assert!(len <= MAX_ENCODED_LEN);
    }
}

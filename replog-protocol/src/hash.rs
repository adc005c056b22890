//! File name hashing.
//!
//! Sender and receiver identify a file by a 32-bit digest of its path so
//! the full name only travels in `GetSize`. The digest is Paul Hsieh's
//! SuperFastHash; both ends must agree on it bit for bit, including the
//! sign extension of trailing bytes.

#[inline]
fn get16bits(data: &[u8]) -> u32 {
    u32::from(data[0]) | (u32::from(data[1]) << 8)
}

#[inline]
fn signed(byte: u8) -> u32 {
    byte as i8 as i32 as u32
}

/// Hashes a file name. Returns 0 for empty input.
pub fn name_hash(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }

    let mut hash = data.len() as u32;
    let mut chunks = data.chunks_exact(4);

    for chunk in &mut chunks {
        hash = hash.wrapping_add(get16bits(chunk));
        let tmp = (get16bits(&chunk[2..]) << 11) ^ hash;
        hash = (hash << 16) ^ tmp;
        hash = hash.wrapping_add(hash >> 11);
    }

    let rem = chunks.remainder();
    match rem.len() {
        3 => {
            hash = hash.wrapping_add(get16bits(rem));
            hash ^= hash << 16;
            hash ^= signed(rem[2]) << 18;
            hash = hash.wrapping_add(hash >> 11);
        }
        2 => {
            hash = hash.wrapping_add(get16bits(rem));
            hash ^= hash << 11;
            hash = hash.wrapping_add(hash >> 17);
        }
        1 => {
            hash = hash.wrapping_add(signed(rem[0]));
            hash ^= hash << 10;
            hash = hash.wrapping_add(hash >> 1);
        }
        _ => {}
    }

    // Final avalanche
    hash ^= hash << 3;
    hash = hash.wrapping_add(hash >> 5);
    hash ^= hash << 4;
    hash = hash.wrapping_add(hash >> 17);
    hash ^= hash << 25;
    hash = hash.wrapping_add(hash >> 6);

    hash
}

/// Hashes a file name given as a string.
#[inline]
pub fn hash_str(name: &str) -> u32 {
    name_hash(name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(hash_str("test.log"), 0xF015_18F4);
        assert_eq!(hash_str("/var/log/app.log"), 0xEEF9_A047);
    }

    #[test]
    fn test_every_tail_length() {
        assert_eq!(hash_str("a"), 0x115E_A782);
        assert_eq!(hash_str("ab"), 0x516B_8B44);
        assert_eq!(hash_str("abc"), 0xD2BE_198A);
    }

    #[test]
    fn test_high_bytes_are_sign_extended() {
        // "é" as UTF-8 is two bytes, "xé" leaves 0xA9 as a signed tail byte
        assert_eq!(hash_str("é"), 0xC4FB_A554);
        assert_eq!(hash_str("xé"), 0xE9DF_37D1);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(name_hash(b""), 0);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash_str("data/segment-0001"), hash_str("data/segment-0001"));
        assert_ne!(hash_str("data/segment-0001"), hash_str("data/segment-0002"));
    }
}

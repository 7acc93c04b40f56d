const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Mask keeping identifiers inside the non-negative range of an `i64`.
pub const ID_MASK: u64 = u64::MAX >> 1;

/// A 64-bit FNV-1a hasher over an explicit byte encoding.
///
/// Unlike [`std::collections::hash_map::DefaultHasher`] the output is fixed
/// across processes, platforms and compiler versions, so it can be used to
/// derive identifiers that get persisted.
#[derive(Debug, Clone)]
pub struct StableHasher {
    state: u64,
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StableHasher {
    /// Create a hasher in its initial state.
    pub fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    /// Feed raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    /// Feed a single tag byte.
    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    /// Feed an unsigned 32-bit integer in little-endian order.
    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Feed an unsigned 64-bit integer in little-endian order.
    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Feed a float by its IEEE-754 bits, with `-0.0` folded onto `0.0`.
    pub fn write_f64(&mut self, v: f64) {
        let v = if v == 0.0 { 0.0 } else { v };
        self.write_u64(v.to_bits());
    }

    /// Feed a length-prefixed string.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    /// The raw 64-bit digest.
    pub fn finish(&self) -> u64 {
        self.state
    }

    /// The digest masked to a 63-bit identifier.
    pub fn finish_id(&self) -> u64 {
        self.state & ID_MASK
    }
}

/// Draw a random 63-bit identifier.
///
/// Collisions are negligible (birthday bound around 3e9 draws for a 50% chance)
/// so callers do not check for uniqueness.
pub fn random_id() -> u64 {
    rand::random::<u64>() & ID_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        let h = StableHasher::new();
        assert_eq!(h.finish(), 0xcbf2_9ce4_8422_2325);

        let mut h = StableHasher::new();
        h.write_bytes(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_negative_zero_is_folded() {
        let mut a = StableHasher::new();
        a.write_f64(0.0);
        let mut b = StableHasher::new();
        b.write_f64(-0.0);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_strings_are_length_prefixed() {
        let mut a = StableHasher::new();
        a.write_str("ab");
        a.write_str("c");
        let mut b = StableHasher::new();
        b.write_str("a");
        b.write_str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_ids_fit_in_63_bits() {
        for _ in 0..64 {
            assert!(random_id() <= ID_MASK);
        }
        let mut h = StableHasher::new();
        h.write_str("anything");
        assert!(h.finish_id() <= ID_MASK);
    }
}

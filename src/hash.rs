//! FNV-1a content hashing (64-bit and 128-bit)
//!
//! The 64-bit variant derives stable block ids from human-readable names.
//! The 128-bit variant provides per-block and whole-archive integrity
//! digests. Both are byte-exact standard FNV-1a; tests pin known-answer
//! vectors against the reference seeds and primes.

use std::fmt;

/// FNV-1a 64-bit offset basis
pub const FNV64_SEED: u64 = 0xCBF2_9CE4_8422_2325;

/// FNV-1a 64-bit prime
pub const FNV64_PRIME: u64 = 0x0000_0100_0000_01B3;

/// FNV-1a 128-bit offset basis
pub const FNV128_SEED: u128 = 0x6C62_272E_07BB_0142_62B8_2175_6295_C58D;

/// FNV-1a 128-bit prime (2^88 + 2^8 + 0x3B)
pub const FNV128_PRIME: u128 = 0x0000_0000_0100_0000_0000_0000_0000_013B;

/// Hash a byte span with FNV-1a at 64-bit width.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV64_SEED;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

/// Hash a byte span with FNV-1a at 128-bit width.
pub fn fnv1a_128(bytes: &[u8]) -> Hash128 {
    let mut hash = FNV128_SEED;
    for &byte in bytes {
        hash ^= byte as u128;
        hash = hash.wrapping_mul(FNV128_PRIME);
    }
    Hash128::from_u128(hash)
}

/// A 128-bit content hash.
///
/// Stored as two 64-bit words. The wire encoding is little-endian with the
/// low word first, so `to_le_bytes` of the whole value matches
/// `u128::to_le_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash128 {
    pub lo: u64,
    pub hi: u64,
}

impl Hash128 {
    pub const SIZE: usize = 16;

    pub fn from_u128(value: u128) -> Self {
        Hash128 {
            lo: value as u64,
            hi: (value >> 64) as u64,
        }
    }

    pub fn to_u128(self) -> u128 {
        ((self.hi as u128) << 64) | self.lo as u128
    }

    pub fn to_le_bytes(self) -> [u8; 16] {
        self.to_u128().to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Hash128::from_u128(u128::from_le_bytes(bytes))
    }
}

impl fmt::Display for Hash128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

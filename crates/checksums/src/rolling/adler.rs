//! crates/checksums/src/rolling/adler.rs
//!
//! The two Adler-style rolling checksum variants.

/// Modulus used by the canonical Adler-32 definition.
const MOD_ADLER: u32 = 65_521;

/// Adler checksum with both components truncated to 16 bits.
///
/// Additions and subtractions wrap modulo 2^16, so rotation stays exact even
/// though the sums overflow for windows larger than a few hundred bytes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Adler32;

impl Adler32 {
    /// Wire name of the variant.
    pub const NAME: &'static str = "Adler32";

    /// Computes the checksum of `window`.
    #[must_use]
    pub fn calculate(window: &[u8]) -> u32 {
        let mut a: u16 = 1;
        let mut b: u16 = 0;
        for &byte in window {
            a = a.wrapping_add(u16::from(byte));
            b = b.wrapping_add(a);
        }
        pack(u32::from(a), u32::from(b))
    }

    /// Slides the window by one byte.
    #[must_use]
    pub fn rotate(checksum: u32, outgoing: u8, incoming: u8, window_len: usize) -> u32 {
        let (a, b) = unpack(checksum);
        let (a, b) = (a as u16, b as u16);
        let weighted = (window_len as u32).wrapping_mul(u32::from(outgoing)) as u16;

        let a = a
            .wrapping_sub(u16::from(outgoing))
            .wrapping_add(u16::from(incoming));
        let b = b.wrapping_sub(weighted).wrapping_add(a).wrapping_sub(1);
        pack(u32::from(a), u32::from(b))
    }
}

/// Adler checksum with both components reduced modulo 65521.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Adler32V2;

impl Adler32V2 {
    /// Wire name of the variant.
    pub const NAME: &'static str = "Adler32V2";

    /// Computes the checksum of `window`.
    #[must_use]
    pub fn calculate(window: &[u8]) -> u32 {
        let mut a: u32 = 1;
        let mut b: u32 = 0;
        for &byte in window {
            a = (a + u32::from(byte)) % MOD_ADLER;
            b = (b + a) % MOD_ADLER;
        }
        pack(a, b)
    }

    /// Slides the window by one byte.
    #[must_use]
    pub fn rotate(checksum: u32, outgoing: u8, incoming: u8, window_len: usize) -> u32 {
        let modulus = u64::from(MOD_ADLER);
        let (a, b) = unpack(checksum);
        let a = u64::from(a) % modulus;
        let b = u64::from(b) % modulus;
        let outgoing = u64::from(outgoing);
        let incoming = u64::from(incoming);
        let weighted = (window_len as u64 % modulus) * outgoing % modulus;

        let a = (a + modulus - outgoing + incoming) % modulus;
        let b = (b + 2 * modulus - weighted + a - 1) % modulus;
        pack(a as u32, b as u32)
    }
}

#[inline]
const fn pack(a: u32, b: u32) -> u32 {
    (b << 16) | (a & 0xffff)
}

#[inline]
const fn unpack(checksum: u32) -> (u32, u32) {
    (checksum & 0xffff, checksum >> 16)
}

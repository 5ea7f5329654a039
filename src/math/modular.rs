//! Word-sized modular arithmetic shared by the RNS channels.
//!
//! Every modulus used by the crate is below `2^61`, so sums of two reduced
//! residues never overflow `u64` and products are reduced through `u128`.

#[inline]
pub fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    let s = a + b;
    if s >= q { s - q } else { s }
}

#[inline]
pub fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    if a >= b { a - b } else { a + q - b }
}

#[inline]
pub fn neg_mod(a: u64, q: u64) -> u64 {
    if a == 0 { 0 } else { q - a }
}

#[inline]
pub fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

/// Computes `base^exponent mod modulus` by square-and-multiply.
///
/// # Panics
///
/// Panics if `modulus == 0`.
pub fn mod_pow(mut base: u64, mut exponent: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mod_pow: modulus must be positive");
    if modulus == 1 {
        return 0;
    }
    let mut acc = 1u64;
    base %= modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exponent >>= 1;
    }
    acc
}

/// Inverse of `value` modulo `modulus`, or `None` when they share a factor.
pub fn mod_inverse(value: u64, modulus: u64) -> Option<u64> {
    let (mut old_r, mut r) = ((value % modulus) as i128, modulus as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(modulus as i128) as u64)
}

/// Maps a residue in `[0, q)` to its centered representative in `(-q/2, q/2]`.
#[inline]
pub fn center(value: u64, q: u64) -> i64 {
    if value > q / 2 {
        -((q - value) as i64)
    } else {
        value as i64
    }
}

/// Reduces a signed integer into `[0, q)`.
#[inline]
pub fn reduce_signed(value: i64, q: u64) -> u64 {
    (value as i128).rem_euclid(q as i128) as u64
}

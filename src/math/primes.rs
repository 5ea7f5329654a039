//! Prime search for the modulus chain.
//!
//! Primality is decided by Miller-Rabin with a fixed set of bases, which is
//! deterministic over the whole `u64` range. Chain primes must additionally
//! satisfy `p = 1 (mod 2N)` so that `Z_p` carries a primitive `2N`-th root of
//! unity for the negacyclic NTT over `X^N + 1`.
//!
//! Reference:
//! https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test

use super::modular::{mod_pow, mul_mod};

// Deterministic for all n < 3.18e23, which covers every u64.
// Source: https://miller-rabin.appspot.com/
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    let r = n.trailing_zeros();
    (n >> r, r)
}

/// Returns `true` if `n` is prime.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Returns `true` when `p` is prime and `p = 1 (mod 2n)`.
#[inline]
pub fn is_ntt_friendly_prime(p: u64, n: u64) -> bool {
    match n.checked_mul(2) {
        Some(step) if n > 0 => is_prime(p) && p % step == 1,
        _ => false,
    }
}

/// Returns the largest NTT-friendly prime for degree `n` strictly below `bound`
/// and not contained in `exclude`.
pub fn largest_ntt_prime_below(bound: u64, n: u64, exclude: &[u64]) -> Option<u64> {
    let step = n.checked_mul(2)?;
    if n == 0 || bound <= step {
        return None;
    }
    // Largest candidate < bound with candidate % step == 1.
    let top = bound - 1;
    let mut candidate = top - (top + step - 1) % step;

    loop {
        if candidate <= 2 {
            return None;
        }
        if !exclude.contains(&candidate) && is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_sub(step)?;
    }
}

/// Generates one distinct NTT-friendly prime per requested bit-size.
///
/// Each prime is the largest admissible one below `2^bits` that is not already
/// used by an earlier entry, so repeated sizes such as `[60, 40, 40, 60]`
/// resolve to four distinct moduli. Returns `None` if some bit-size has no
/// admissible prime left.
pub fn ntt_prime_chain(bit_sizes: &[u32], n: u64) -> Option<Vec<u64>> {
    let mut primes: Vec<u64> = Vec::with_capacity(bit_sizes.len());
    for &bits in bit_sizes {
        if bits == 0 || bits >= 63 {
            return None;
        }
        let prime = largest_ntt_prime_below(1u64 << bits, n, &primes)?;
        // Stay within the requested size.
        if prime < (1u64 << (bits - 1)) {
            return None;
        }
        primes.push(prime);
    }
    Some(primes)
}

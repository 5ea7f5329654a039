use std::{cmp::Ordering, sync::Arc};

use crate::math::{
    is_ntt_friendly_prime,
    modular::{add_mod, mod_inverse, mod_pow, mul_mod, sub_mod},
};

use super::errors::{RingError, RingResult};

/// Precomputed tables for the negacyclic NTT modulo one prime.
///
/// The transform first twists by powers of a primitive `2N`-th root `psi`, so
/// that a cyclic length-`N` transform with `omega = psi^2` evaluates the
/// polynomial at the odd powers of `psi`. Pointwise products in that domain are
/// products in `Z_q[X]/(X^N + 1)`.
#[derive(Debug, Clone)]
pub struct NttTable {
    pub modulus: u64,
    pub degree: usize,
    psi_powers: Vec<u64>,
    // psi^{-i} * N^{-1}, folded so the inverse untwists and normalises in one pass.
    psi_inv_powers_scaled: Vec<u64>,
    roots: Vec<u64>,
    inverse_roots: Vec<u64>,
}

impl NttTable {
    pub fn new(modulus: u64, degree: usize) -> RingResult<Self> {
        if degree < 2 || !degree.is_power_of_two() {
            return Err(RingError::InvalidDegree { degree });
        }
        if !is_ntt_friendly_prime(modulus, degree as u64) {
            return Err(RingError::NonNttFriendlyModulus { modulus, degree });
        }
        let psi = find_negacyclic_root(modulus, degree)
            .ok_or(RingError::NonNttFriendlyModulus { modulus, degree })?;
        // Both inverses exist because the modulus is prime.
        let psi_inv = mod_inverse(psi, modulus)
            .ok_or(RingError::NonNttFriendlyModulus { modulus, degree })?;
        let n_inv = mod_inverse(degree as u64, modulus)
            .ok_or(RingError::NonNttFriendlyModulus { modulus, degree })?;

        let psi_powers = powers(psi, degree, modulus);
        let psi_inv_powers_scaled = powers(psi_inv, degree, modulus)
            .into_iter()
            .map(|p| mul_mod(p, n_inv, modulus))
            .collect();
        let omega = mul_mod(psi, psi, modulus);
        let omega_inv = mul_mod(psi_inv, psi_inv, modulus);

        Ok(Self {
            modulus,
            degree,
            psi_powers,
            psi_inv_powers_scaled,
            roots: powers(omega, degree / 2, modulus),
            inverse_roots: powers(omega_inv, degree / 2, modulus),
        })
    }

    /// Coefficient domain to evaluation domain, in place.
    pub fn forward(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree);
        for (v, &p) in values.iter_mut().zip(&self.psi_powers) {
            *v = mul_mod(*v, p, self.modulus);
        }
        cyclic_transform(values, &self.roots, self.modulus);
    }

    /// Evaluation domain back to coefficient domain, in place.
    pub fn inverse(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree);
        cyclic_transform(values, &self.inverse_roots, self.modulus);
        for (v, &p) in values.iter_mut().zip(&self.psi_inv_powers_scaled) {
            *v = mul_mod(*v, p, self.modulus);
        }
    }
}

/// RNS basis: an ordered set of distinct NTT-friendly primes sharing one ring
/// degree, with the tables needed for NTT multiplication and CRT decoding.
///
/// Invariant: `moduli.len() == ntt_tables.len()` and
/// `ntt_tables[i].modulus == moduli[i]` for all `i`.
#[derive(Debug, Clone)]
pub struct RnsBasis {
    degree: usize,
    moduli: Vec<u64>,
    ntt_tables: Vec<Arc<NttTable>>,
    // garner[i][j] = q_j^{-1} mod q_i for j < i
    garner: Vec<Vec<u64>>,
    // radix[i] = q_0 * ... * q_{i-1} as a float
    radix: Vec<f64>,
}

impl PartialEq for RnsBasis {
    fn eq(&self, other: &Self) -> bool {
        self.degree == other.degree && self.moduli == other.moduli
    }
}

impl Eq for RnsBasis {}

impl RnsBasis {
    pub fn new(degree: usize, moduli: Vec<u64>) -> RingResult<Self> {
        if degree < 2 || !degree.is_power_of_two() {
            return Err(RingError::InvalidDegree { degree });
        }
        if moduli.is_empty() {
            return Err(RingError::EmptyBasis);
        }
        let mut ntt_tables = Vec::with_capacity(moduli.len());
        for (i, &modulus) in moduli.iter().enumerate() {
            if moduli[..i].contains(&modulus) {
                return Err(RingError::DuplicateModulus { modulus });
            }
            ntt_tables.push(Arc::new(NttTable::new(modulus, degree)?));
        }
        Ok(Self::from_tables(degree, ntt_tables))
    }

    fn from_tables(degree: usize, ntt_tables: Vec<Arc<NttTable>>) -> Self {
        let moduli: Vec<u64> = ntt_tables.iter().map(|t| t.modulus).collect();
        let garner = moduli
            .iter()
            .enumerate()
            .map(|(i, &qi)| {
                moduli[..i]
                    .iter()
                    // Distinct primes are pairwise coprime.
                    .map(|&qj| mod_inverse(qj % qi, qi).unwrap_or(0))
                    .collect()
            })
            .collect();
        let mut radix = Vec::with_capacity(moduli.len());
        let mut acc = 1.0f64;
        for &q in &moduli {
            radix.push(acc);
            acc *= q as f64;
        }
        Self {
            degree,
            moduli,
            ntt_tables,
            garner,
            radix,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn ntt_table(&self, channel: usize) -> &NttTable {
        &self.ntt_tables[channel]
    }

    pub fn channel_count(&self) -> usize {
        self.moduli.len()
    }

    /// `log2` of the product of all moduli.
    pub fn log2_modulus(&self) -> f64 {
        self.moduli.iter().map(|&q| (q as f64).log2()).sum()
    }

    /// Returns the basis made of the first `count` channels.
    pub fn prefix(&self, count: usize) -> RingResult<Self> {
        let channel_count = self.channel_count();
        if count == 0 || count > channel_count {
            return Err(RingError::InvalidModDrop {
                drop_count: channel_count.saturating_sub(count),
                channel_count,
            });
        }
        Ok(Self::from_tables(
            self.degree,
            self.ntt_tables[..count].to_vec(),
        ))
    }

    /// Returns a new basis with the last `drop_count` channels removed.
    pub fn drop_last(&self, drop_count: usize) -> RingResult<Self> {
        let channel_count = self.channel_count();
        if drop_count >= channel_count {
            return Err(RingError::InvalidModDrop {
                drop_count,
                channel_count,
            });
        }
        self.prefix(channel_count - drop_count)
    }

    /// Returns the basis formed by the given channels, in the given order.
    pub fn select(&self, indices: &[usize]) -> RingResult<Self> {
        if indices.is_empty() {
            return Err(RingError::EmptyBasis);
        }
        let mut tables = Vec::with_capacity(indices.len());
        for &index in indices {
            let table = self.ntt_tables.get(index).ok_or(
                RingError::ChannelOutOfRange {
                    index,
                    channel_count: self.channel_count(),
                },
            )?;
            if tables.iter().any(|t: &Arc<NttTable>| t.modulus == table.modulus) {
                return Err(RingError::DuplicateModulus {
                    modulus: table.modulus,
                });
            }
            tables.push(Arc::clone(table));
        }
        Ok(Self::from_tables(self.degree, tables))
    }

    /// CRT-reconstructs one coefficient, centres it in `(-Q/2, Q/2]` and
    /// returns it as a float.
    ///
    /// Uses Garner's mixed-radix form so no multi-word integer is needed: the
    /// digits of `x` and of `Q - x` are compared from the most significant
    /// end to pick the representative with the smaller magnitude.
    pub fn reconstruct_centered(&self, residues: &[u64]) -> f64 {
        debug_assert_eq!(residues.len(), self.moduli.len());
        let positive = self.mixed_radix_digits(residues.iter().copied());
        let negative = self.mixed_radix_digits(
            residues
                .iter()
                .zip(&self.moduli)
                .map(|(&r, &q)| sub_mod(0, r, q)),
        );

        let (digits, sign) =
            match positive.iter().rev().cmp(negative.iter().rev()) {
                Ordering::Greater => (&negative, -1.0),
                _ => (&positive, 1.0),
            };
        let magnitude: f64 = digits
            .iter()
            .zip(&self.radix)
            .rev()
            .map(|(&d, &w)| d as f64 * w)
            .sum();
        sign * magnitude
    }

    fn mixed_radix_digits(&self, residues: impl Iterator<Item = u64>) -> Vec<u64> {
        let mut digits: Vec<u64> = Vec::with_capacity(self.moduli.len());
        for (i, r) in residues.enumerate() {
            let qi = self.moduli[i];
            let mut t = r;
            for (j, &digit) in digits.iter().enumerate() {
                t = mul_mod(sub_mod(t, digit % qi, qi), self.garner[i][j], qi);
            }
            digits.push(t);
        }
        digits
    }
}

// ─── Private number-theory helpers ───────────────────────────────────────────

/// Finds `psi` with `psi^N = -1`, i.e. a primitive `2N`-th root of unity.
fn find_negacyclic_root(modulus: u64, degree: usize) -> Option<u64> {
    let exponent = (modulus - 1) / (2 * degree as u64);
    (2..modulus)
        .map(|g| mod_pow(g, exponent, modulus))
        .find(|&psi| mod_pow(psi, degree as u64, modulus) == modulus - 1)
}

fn powers(base: u64, count: usize, modulus: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(count);
    let mut acc = 1u64;
    for _ in 0..count {
        out.push(acc);
        acc = mul_mod(acc, base, modulus);
    }
    out
}

fn reverse_bits(value: usize, bit_count: u32) -> usize {
    if bit_count == 0 {
        return value;
    }
    value.reverse_bits() >> (usize::BITS - bit_count)
}

/// Iterative radix-2 Cooley-Tukey over `Z_q`; `roots[k] = omega^k`.
fn cyclic_transform(values: &mut [u64], roots: &[u64], modulus: u64) {
    let n = values.len();
    let bit_count = n.trailing_zeros();
    for i in 0..n {
        let j = reverse_bits(i, bit_count);
        if i < j {
            values.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let step = n / len;
        for start in (0..n).step_by(len) {
            for offset in 0..half {
                let left = start + offset;
                let right = left + half;
                let t = mul_mod(values[right], roots[offset * step], modulus);
                let u = values[left];
                values[left] = add_mod(u, t, modulus);
                values[right] = sub_mod(u, t, modulus);
            }
        }
        len <<= 1;
    }
}

use super::{
    basis::RnsBasis,
    errors::{RingError, RingResult},
    traits::{PolyModSwitch, PolyRing, PolySampler},
};
use crate::math::{
    modular::{add_mod, center, mod_inverse, mul_mod, neg_mod, reduce_signed, sub_mod},
    sampling::{gaussian_coefficients, ternary_coefficients, uniform_coefficients},
};
use rand::Rng;
use std::{
    ops::{AddAssign, MulAssign, Neg, SubAssign},
    sync::Arc,
};

/// A polynomial in `Z_{q_0} x ... x Z_{q_{k-1}}[X] / (X^N + 1)`.
///
/// Stores one coefficient vector per RNS channel, always in coefficient
/// domain; multiplication goes through the NTT internally.
///
/// # Invariants
/// - `channels.len() == basis.channel_count()`
/// - `channels[i].len() == basis.degree()`
/// - Every `channels[i][j] < basis.moduli()[i]`
#[derive(Clone, Debug)]
pub struct RnsPoly {
    channels: Vec<Vec<u64>>,
    basis: Arc<RnsBasis>,
}

impl PartialEq for RnsPoly {
    fn eq(&self, other: &Self) -> bool {
        self.basis == other.basis && self.channels == other.channels
    }
}

// ─── Constructors ─────────────────────────────────────────────────────────────

impl RnsPoly {
    /// Creates the zero polynomial.
    pub fn zero(basis: Arc<RnsBasis>) -> Self {
        let channels = vec![vec![0u64; basis.degree()]; basis.channel_count()];
        Self { channels, basis }
    }

    /// Creates a polynomial from signed integer coefficients.
    ///
    /// Each coefficient is reduced into `[0, q_i)` per channel. Accepts slices
    /// of length >= N; only the first N elements are used.
    pub fn from_coeffs(coeffs: &[i64], basis: Arc<RnsBasis>) -> Self {
        let degree = basis.degree();
        assert!(
            coeffs.len() >= degree,
            "from_coeffs: need at least {degree} coefficients, got {}",
            coeffs.len()
        );
        let channels = basis
            .moduli()
            .iter()
            .map(|&q| coeffs[..degree].iter().map(|&c| reduce_signed(c, q)).collect())
            .collect();
        Self { channels, basis }
    }

    /// Creates a polynomial from integral float coefficients of any magnitude
    /// representable by `f64`.
    ///
    /// Callers round beforehand and bound the magnitude against the basis.
    pub fn from_integral_f64(coeffs: &[f64], basis: Arc<RnsBasis>) -> RingResult<Self> {
        let degree = basis.degree();
        if coeffs.len() != degree {
            return Err(RingError::DegreeMismatch {
                expected: degree,
                actual: coeffs.len(),
            });
        }
        let channels = basis
            .moduli()
            .iter()
            .map(|&q| coeffs.iter().map(|&c| f64_to_residue(c, q)).collect())
            .collect();
        Ok(Self { channels, basis })
    }

    /// Creates a polynomial from pre-built channel vectors.
    ///
    /// Returns an error if the shape doesn't match the basis, or if any
    /// coefficient is not reduced (i.e., >= the corresponding modulus).
    pub fn from_channels(channels: Vec<Vec<u64>>, basis: Arc<RnsBasis>) -> RingResult<Self> {
        let expected = basis.channel_count();
        let actual = channels.len();
        if actual != expected {
            return Err(RingError::ChannelCountMismatch { expected, actual });
        }
        for (channel, &q) in channels.iter().zip(basis.moduli()) {
            if channel.len() != basis.degree() {
                return Err(RingError::DegreeMismatch {
                    expected: basis.degree(),
                    actual: channel.len(),
                });
            }
            if let Some(&c) = channel.iter().find(|&&c| c >= q) {
                return Err(RingError::NonReducedCoefficient {
                    coefficient: c,
                    modulus: q,
                });
            }
        }
        Ok(Self { channels, basis })
    }
}

// ─── Accessors ────────────────────────────────────────────────────────────────

impl RnsPoly {
    pub fn channels(&self) -> &[Vec<u64>] {
        &self.channels
    }

    pub fn basis(&self) -> &Arc<RnsBasis> {
        &self.basis
    }

    pub fn degree(&self) -> usize {
        self.basis.degree()
    }

    /// Reinterprets channel `index` as a small centred polynomial and reduces
    /// it into every modulus of `target`.
    pub fn lift_channel(&self, index: usize, target: Arc<RnsBasis>) -> RingResult<Self> {
        let source = self.channels.get(index).ok_or(RingError::ChannelOutOfRange {
            index,
            channel_count: self.channels.len(),
        })?;
        if target.degree() != self.degree() {
            return Err(RingError::DegreeMismatch {
                expected: self.degree(),
                actual: target.degree(),
            });
        }
        let q = self.basis.moduli()[index];
        let centered: Vec<i64> = source.iter().map(|&c| center(c, q)).collect();
        Ok(Self::from_coeffs(&centered, target))
    }

    /// Keeps the channels whose moduli appear in `target`, in `target`'s order.
    ///
    /// Valid because a residue modulo `Q` determines the residue modulo every
    /// prime dividing `Q`.
    pub fn restrict_to(&self, target: Arc<RnsBasis>) -> RingResult<Self> {
        let mut channels = Vec::with_capacity(target.channel_count());
        for &modulus in target.moduli() {
            let index = self
                .basis
                .moduli()
                .iter()
                .position(|&q| q == modulus)
                .ok_or(RingError::ModulusNotInBasis { modulus })?;
            channels.push(self.channels[index].clone());
        }
        Ok(Self {
            channels,
            basis: target,
        })
    }
}

// ─── Arithmetic ───────────────────────────────────────────────────────────────

impl AddAssign<&RnsPoly> for RnsPoly {
    /// Coefficient-wise addition modulo each `q_i`.
    fn add_assign(&mut self, rhs: &RnsPoly) {
        assert!(*self.basis == *rhs.basis, "add_assign: basis mismatch");
        for ((channel, other), &q) in self
            .channels
            .iter_mut()
            .zip(&rhs.channels)
            .zip(self.basis.moduli())
        {
            for (a, &b) in channel.iter_mut().zip(other) {
                *a = add_mod(*a, b, q);
            }
        }
    }
}

impl SubAssign<&RnsPoly> for RnsPoly {
    fn sub_assign(&mut self, rhs: &RnsPoly) {
        assert!(*self.basis == *rhs.basis, "sub_assign: basis mismatch");
        for ((channel, other), &q) in self
            .channels
            .iter_mut()
            .zip(&rhs.channels)
            .zip(self.basis.moduli())
        {
            for (a, &b) in channel.iter_mut().zip(other) {
                *a = sub_mod(*a, b, q);
            }
        }
    }
}

impl MulAssign<&RnsPoly> for RnsPoly {
    /// Polynomial multiplication in `Z[X]/(X^N + 1)`, per channel, via the
    /// negacyclic NTT.
    fn mul_assign(&mut self, rhs: &RnsPoly) {
        assert!(*self.basis == *rhs.basis, "mul_assign: basis mismatch");
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let table = self.basis.ntt_table(ch);
            let q = table.modulus;
            let mut other = rhs.channels[ch].clone();
            table.forward(channel);
            table.forward(&mut other);
            for (a, &b) in channel.iter_mut().zip(&other) {
                *a = mul_mod(*a, b, q);
            }
            table.inverse(channel);
        }
    }
}

impl Neg for RnsPoly {
    type Output = Self;

    /// Coefficient-wise negation modulo each `q_i`.
    fn neg(mut self) -> Self {
        for (channel, &q) in self.channels.iter_mut().zip(self.basis.moduli()) {
            for c in channel.iter_mut() {
                *c = neg_mod(*c, q);
            }
        }
        self
    }
}

// ─── Modulus switching ────────────────────────────────────────────────────────

impl PolyModSwitch for RnsPoly {
    fn drop_last(&self, drop_count: usize) -> RingResult<Self> {
        let reduced = Arc::new(self.basis.drop_last(drop_count)?);
        let keep = reduced.channel_count();
        Ok(Self {
            channels: self.channels[..keep].to_vec(),
            basis: reduced,
        })
    }

    /// Computes `round(x / q_last)` over the remaining moduli.
    ///
    /// `x - [x]_{q_last}` (centred) is an exact multiple of `q_last`, so each
    /// remaining channel is `(x_i - [x]_{q_last}) * q_last^{-1} mod q_i`.
    fn divide_round_by_last(&self) -> RingResult<Self> {
        let reduced = Arc::new(self.basis.drop_last(1)?);
        let last = self.channels.len() - 1;
        let q_last = self.basis.moduli()[last];
        let tail: Vec<i64> = self.channels[last].iter().map(|&c| center(c, q_last)).collect();

        let mut channels = Vec::with_capacity(last);
        for (channel, &qi) in self.channels[..last].iter().zip(reduced.moduli()) {
            let inv = mod_inverse(q_last % qi, qi).ok_or(RingError::DuplicateModulus {
                modulus: qi,
            })?;
            channels.push(
                channel
                    .iter()
                    .zip(&tail)
                    .map(|(&x, &t)| mul_mod(sub_mod(x, reduce_signed(t, qi), qi), inv, qi))
                    .collect(),
            );
        }
        Ok(Self {
            channels,
            basis: reduced,
        })
    }
}

// ─── PolyRing trait ───────────────────────────────────────────────────────────

impl PolyRing for RnsPoly {
    type Context = Arc<RnsBasis>;

    fn zero(context: &Self::Context) -> Self {
        Self::zero(context.clone())
    }

    fn from_coeffs(coeffs: &[i64], context: &Self::Context) -> Self {
        Self::from_coeffs(coeffs, context.clone())
    }

    /// CRT-reconstructs each coefficient centred in `(-Q/2, Q/2]`.
    fn to_centered_f64(&self) -> Vec<f64> {
        let mut residues = vec![0u64; self.channels.len()];
        (0..self.degree())
            .map(|i| {
                for (r, channel) in residues.iter_mut().zip(&self.channels) {
                    *r = channel[i];
                }
                self.basis.reconstruct_centered(&residues)
            })
            .collect()
    }

    fn context(&self) -> &Self::Context {
        &self.basis
    }
}

// ─── PolySampler trait ────────────────────────────────────────────────────────

impl PolySampler for RnsPoly {
    /// Samples with coefficients uniform in `[0, q_i)` per channel.
    fn sample_uniform<R: Rng + ?Sized>(context: &Self::Context, rng: &mut R) -> Self {
        let channels = context
            .moduli()
            .iter()
            .map(|&q| uniform_coefficients(context.degree(), q, rng))
            .collect();
        Self {
            channels,
            basis: context.clone(),
        }
    }

    /// Samples rounded noise from `N(0, std_dev^2)`, CRT-encoded per channel.
    fn sample_gaussian<R: Rng + ?Sized>(
        std_dev: f64,
        context: &Self::Context,
        rng: &mut R,
    ) -> Self {
        let noise = gaussian_coefficients(context.degree(), std_dev, rng);
        Self::from_coeffs(&noise, context.clone())
    }

    /// Samples a ternary polynomial with exactly `hamming_weight` non-zero coefficients.
    fn sample_tribits<R: Rng + ?Sized>(
        hamming_weight: usize,
        context: &Self::Context,
        rng: &mut R,
    ) -> Self {
        let ternary = ternary_coefficients(context.degree(), hamming_weight, rng);
        Self::from_coeffs(&ternary, context.clone())
    }
}

/// Reduces an integral float into `[0, q)`.
///
/// Values below `2^62` go through `i64`; larger ones are split into mantissa
/// and power-of-two exponent, both reduced separately.
fn f64_to_residue(value: f64, q: u64) -> u64 {
    const SMALL: f64 = (1u64 << 62) as f64;
    if value.abs() < SMALL {
        return reduce_signed(value as i64, q);
    }
    let bits = value.abs().to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    let mut residue = mantissa % q;
    // |value| >= 2^62 implies a non-negative exponent here.
    let mut two_pow = 2 % q;
    let mut e = exponent.max(0) as u64;
    while e > 0 {
        if e & 1 == 1 {
            residue = mul_mod(residue, two_pow, q);
        }
        two_pow = mul_mod(two_pow, two_pow, q);
        e >>= 1;
    }
    if value < 0.0 { neg_mod(residue, q) } else { residue }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn basis_17_97() -> Arc<RnsBasis> {
        Arc::new(RnsBasis::new(8, vec![17, 97]).unwrap())
    }

    fn basis_three() -> Arc<RnsBasis> {
        Arc::new(RnsBasis::new(8, vec![17, 97, 113]).unwrap())
    }

    fn schoolbook(a: &[i64], b: &[i64]) -> Vec<i64> {
        let n = a.len();
        let mut out = vec![0i64; n];
        for i in 0..n {
            for j in 0..n {
                if i + j < n {
                    out[i + j] += a[i] * b[j];
                } else {
                    out[i + j - n] -= a[i] * b[j];
                }
            }
        }
        out
    }

    #[test]
    fn zero_poly_is_all_zeros() {
        let poly = RnsPoly::zero(basis_17_97());
        for ch in poly.channels() {
            assert!(ch.iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn from_coeffs_reduces_correctly() {
        let coeffs = [-1i64, 2, -3, 0, 0, 0, 0, 0];
        let poly = RnsPoly::from_coeffs(&coeffs, basis_17_97());
        assert_eq!(poly.channels()[0][0], 16);
        assert_eq!(poly.channels()[0][1], 2);
        assert_eq!(poly.channels()[0][2], 14);
        assert_eq!(poly.channels()[1][0], 96);
    }

    #[test]
    fn from_channels_rejects_unreduced_coefficient() {
        let channels = vec![vec![17u64; 8], vec![0u64; 8]];
        let result = RnsPoly::from_channels(channels, basis_17_97());
        assert!(matches!(
            result,
            Err(RingError::NonReducedCoefficient {
                coefficient: 17,
                modulus: 17
            })
        ));
    }

    #[test]
    fn from_channels_rejects_wrong_channel_count() {
        let result = RnsPoly::from_channels(vec![vec![0u64; 8]], basis_17_97());
        assert!(matches!(
            result,
            Err(RingError::ChannelCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn add_and_sub_cancel() {
        let basis = basis_three();
        let a = RnsPoly::from_coeffs(&[1, -2, 3, -4, 5, -6, 7, -8], basis.clone());
        let b = RnsPoly::from_coeffs(&[9, 9, 9, 9, -9, -9, -9, -9], basis);
        let mut c = a.clone();
        c += &b;
        c -= &b;
        assert_eq!(c, a);
    }

    #[test]
    fn add_assign_wraps_at_modulus() {
        let basis = basis_17_97();
        let mut a = RnsPoly::from_coeffs(&[16, 0, 0, 0, 0, 0, 0, 0], basis.clone());
        let b = RnsPoly::from_coeffs(&[2, 0, 0, 0, 0, 0, 0, 0], basis);
        a += &b;
        assert_eq!(a.channels()[0][0], 1);
    }

    #[test]
    fn neg_negates_coefficients() {
        let poly = RnsPoly::from_coeffs(&[3, 0, 0, 0, 0, 0, 0, 0], basis_17_97());
        let neg = -poly;
        assert_eq!(neg.channels()[0][0], 14);
        assert_eq!(neg.channels()[0][1], 0);
    }

    #[test]
    fn mul_assign_matches_schoolbook() {
        let basis = basis_three();
        let a = [1i64, 2, -1, 0, 3, 0, 0, -2];
        let b = [0i64, 1, 1, 4, -3, 0, 2, 0];
        let mut p = RnsPoly::from_coeffs(&a, basis.clone());
        p *= &RnsPoly::from_coeffs(&b, basis);
        let expected: Vec<f64> = schoolbook(&a, &b).into_iter().map(|c| c as f64).collect();
        assert_eq!(p.to_centered_f64(), expected);
    }

    #[test]
    fn mul_assign_wraps_around_quotient() {
        // X^7 * X = X^8 = -1
        let basis = basis_17_97();
        let mut x7 = RnsPoly::from_coeffs(&[0, 0, 0, 0, 0, 0, 0, 1], basis.clone());
        let x = RnsPoly::from_coeffs(&[0, 1, 0, 0, 0, 0, 0, 0], basis);
        x7 *= &x;
        let coeffs = x7.to_centered_f64();
        assert_eq!(coeffs[0], -1.0);
        assert!(coeffs[1..].iter().all(|&c| c == 0.0));
    }

    #[test]
    fn drop_last_removes_channels() {
        let poly = RnsPoly::from_coeffs(&[5; 8], basis_three());
        let dropped = poly.drop_last(1).unwrap();
        assert_eq!(dropped.basis().moduli(), &[17, 97]);
        assert_eq!(dropped.channels().len(), 2);
        assert!(dropped.to_centered_f64().iter().all(|&c| c == 5.0));
    }

    #[test]
    fn divide_round_by_last_rounds_to_nearest() {
        let basis = basis_three();
        // 113 * 7 + 50 rounds to 7; 113 * 7 + 60 rounds to 8.
        let coeffs = [113 * 7 + 50, 113 * 7 + 60, -(113 * 3) - 10, 0, 113, -113, 56, 57];
        let poly = RnsPoly::from_coeffs(&coeffs, basis);
        let divided = poly.divide_round_by_last().unwrap();
        assert_eq!(divided.basis().moduli(), &[17, 97]);
        assert_eq!(
            divided.to_centered_f64(),
            vec![7.0, 8.0, -3.0, 0.0, 1.0, -1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn divide_round_by_last_needs_two_channels() {
        let basis = Arc::new(RnsBasis::new(8, vec![97]).unwrap());
        let poly = RnsPoly::zero(basis);
        assert!(matches!(
            poly.divide_round_by_last(),
            Err(RingError::InvalidModDrop { .. })
        ));
    }

    #[test]
    fn lift_channel_centres_residues() {
        let basis = basis_17_97();
        let poly = RnsPoly::from_coeffs(&[-3, 4, 0, 0, 0, 0, 0, 0], basis.clone());
        let lifted = poly.lift_channel(0, basis_three()).unwrap();
        assert_eq!(lifted.to_centered_f64()[..2], [-3.0, 4.0]);
        assert!(poly.lift_channel(2, basis).is_err());
    }

    #[test]
    fn restrict_to_reorders_and_checks_membership() {
        let poly = RnsPoly::from_coeffs(&[-4, 1, 0, 0, 0, 0, 0, 2], basis_three());
        let target = Arc::new(RnsBasis::new(8, vec![113, 17]).unwrap());
        let restricted = poly.restrict_to(target).unwrap();
        assert_eq!(restricted.channels()[0], poly.channels()[2]);
        assert_eq!(restricted.channels()[1], poly.channels()[0]);

        let foreign = Arc::new(RnsBasis::new(8, vec![193]).unwrap());
        assert!(matches!(
            poly.restrict_to(foreign),
            Err(RingError::ModulusNotInBasis { modulus: 193 })
        ));
    }

    #[test]
    fn from_integral_f64_handles_large_magnitudes() {
        let basis = basis_three();
        let big = (1u64 << 63) as f64 * 4.0;
        let mut coeffs = vec![0.0; 8];
        coeffs[0] = big;
        coeffs[1] = -big;
        coeffs[2] = -5.0;
        let poly = RnsPoly::from_integral_f64(&coeffs, basis).unwrap();
        for (channel, &q) in poly.channels().iter().zip(poly.basis().moduli()) {
            let expected = ((1u128 << 65) % q as u128) as u64;
            assert_eq!(channel[0], expected);
            assert_eq!(channel[1], neg_mod(expected, q));
            assert_eq!(channel[2], q - 5);
        }
    }

    #[test]
    fn sample_tribits_has_requested_weight() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let poly = RnsPoly::sample_tribits(4, &basis_three(), &mut rng);
        let coeffs = poly.to_centered_f64();
        assert_eq!(coeffs.iter().filter(|&&c| c != 0.0).count(), 4);
    }

    #[test]
    fn sample_uniform_is_reduced() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let poly = RnsPoly::sample_uniform(&basis_three(), &mut rng);
        for (channel, &q) in poly.channels().iter().zip(poly.basis().moduli()) {
            assert!(channel.iter().all(|&c| c < q));
        }
    }
}

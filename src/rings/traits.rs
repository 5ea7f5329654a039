use rand::Rng;
use std::ops::{AddAssign, MulAssign, Neg, SubAssign};

use super::errors::RingResult;

// Core polynomial ring trait - every CKKS operation works on this
pub trait PolyRing:
    Clone
    + for<'a> AddAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + Neg<Output = Self>
{
    type Context;

    fn zero(context: &Self::Context) -> Self;
    fn from_coeffs(coeffs: &[i64], context: &Self::Context) -> Self;
    fn to_centered_f64(&self) -> Vec<f64>;

    fn context(&self) -> &Self::Context;
}

// Sampling trait - the three distributions key generation and encryption draw from
pub trait PolySampler: PolyRing {
    fn sample_uniform<R: Rng + ?Sized>(context: &Self::Context, rng: &mut R) -> Self;
    fn sample_gaussian<R: Rng + ?Sized>(
        std_dev: f64,
        context: &Self::Context,
        rng: &mut R,
    ) -> Self;
    fn sample_tribits<R: Rng + ?Sized>(
        hamming_weight: usize,
        context: &Self::Context,
        rng: &mut R,
    ) -> Self;
}

// Moving a polynomial down the modulus chain.
pub trait PolyModSwitch: Sized {
    /// Drops the last `drop_count` moduli without scaling.
    fn drop_last(&self, drop_count: usize) -> RingResult<Self>;
    /// Divides by the last modulus with rounding and removes it.
    fn divide_round_by_last(&self) -> RingResult<Self>;
}

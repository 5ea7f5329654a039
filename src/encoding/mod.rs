//! Canonical-embedding encoder.
//!
//! A message of up to N/2 complex slots is identified with the evaluations of
//! a real polynomial `m(X)` at the primitive 2N-th roots `zeta^(5^j)`; the
//! conjugate roots carry the conjugate values so the coefficients come out
//! real. Scaling by `scale` and rounding gives the integer plaintext.

pub mod encoder;

use num_complex::Complex64;

pub use encoder::CkksEncoder;

/// Accepted input views for the slot builder. Keeps encode callers ergonomic for
/// both purely real and complex inputs without forcing extra allocations.
#[derive(Clone, Copy, Debug)]
pub enum SlotInput<'a> {
    Real(&'a [f64]),
    Complex(&'a [Complex64]),
}

impl<'a> SlotInput<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            SlotInput::Real(values) => values.len(),
            SlotInput::Complex(values) => values.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Complex64 {
        match self {
            SlotInput::Real(values) => Complex64::new(values[idx], 0.0),
            SlotInput::Complex(values) => values[idx],
        }
    }
}

impl<'a> From<&'a [f64]> for SlotInput<'a> {
    fn from(values: &'a [f64]) -> Self {
        SlotInput::Real(values)
    }
}

impl<'a> From<&'a [Complex64]> for SlotInput<'a> {
    fn from(values: &'a [Complex64]) -> Self {
        SlotInput::Complex(values)
    }
}

impl<'a> From<&'a Vec<f64>> for SlotInput<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        SlotInput::Real(values.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for SlotInput<'a> {
    fn from(values: &'a [f64; N]) -> Self {
        SlotInput::Real(values.as_slice())
    }
}

impl<'a> From<&'a Vec<Complex64>> for SlotInput<'a> {
    fn from(values: &'a Vec<Complex64>) -> Self {
        SlotInput::Complex(values.as_slice())
    }
}

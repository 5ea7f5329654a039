//! Checked procedure for combining ciphertexts from computation chains of
//! different multiplicative depth.
//!
//! 1. The higher-level operand is mod-switched down to the lower level.
//! 2. Scales that still differ beyond the evaluator tolerance are rejected,
//!    unless the caller acknowledged a drift tolerance, in which case
//!    [`Evaluator::align_scale`] is applied with it (and still rejects
//!    anything beyond it).
//! 3. Only then is `add` or `multiply` called.

use tracing::{debug, warn};

use super::{
    errors::{CkksError, CkksResult},
    evaluator::{Evaluator, scales_match},
    types::Ciphertext,
};

#[derive(Debug, Clone, Copy)]
pub struct AlignmentPolicy<'a> {
    evaluator: &'a Evaluator,
    drift_tolerance: Option<f64>,
}

impl<'a> AlignmentPolicy<'a> {
    pub fn new(evaluator: &'a Evaluator) -> Self {
        Self {
            evaluator,
            drift_tolerance: None,
        }
    }

    /// Allows scales within `tolerance` (relative) to be unified through
    /// `align_scale`.
    pub fn acknowledge_scale_drift(mut self, tolerance: f64) -> Self {
        self.drift_tolerance = Some(tolerance);
        self
    }

    pub fn drift_tolerance(&self) -> Option<f64> {
        self.drift_tolerance
    }

    /// Returns copies of `a` and `b` at a common level with equal scales.
    pub fn align(&self, a: &Ciphertext, b: &Ciphertext) -> CkksResult<(Ciphertext, Ciphertext)> {
        let target = a.level().min(b.level());
        debug!(left = a.level(), right = b.level(), target, "aligning operands");
        let a = self.evaluator.mod_switch_to(a, target)?;
        let b = self.evaluator.mod_switch_to(b, target)?;

        if scales_match(a.scale(), b.scale(), self.evaluator.scale_tolerance()) {
            return Ok((a, b));
        }
        match self.drift_tolerance {
            Some(tolerance) => self.evaluator.align_scale(&a, &b, tolerance),
            None => {
                warn!(
                    left = a.scale(),
                    right = b.scale(),
                    "scales differ and no drift tolerance was acknowledged"
                );
                Err(CkksError::ScaleMismatch {
                    left: a.scale(),
                    right: b.scale(),
                    tolerance: self.evaluator.scale_tolerance(),
                })
            }
        }
    }

    pub fn add_aligned(&self, a: &Ciphertext, b: &Ciphertext) -> CkksResult<Ciphertext> {
        let (a, b) = self.align(a, b)?;
        self.evaluator.add(&a, &b)
    }

    pub fn multiply_aligned(&self, a: &Ciphertext, b: &Ciphertext) -> CkksResult<Ciphertext> {
        let (a, b) = self.align(a, b)?;
        self.evaluator.multiply(&a, &b)
    }
}

//! Homomorphic operations with scale and level bookkeeping.
//!
//! Every binary operation checks, in order: shared context, shared secret
//! key, equal levels, then the operation-specific state (component count,
//! scale agreement, remaining modulus). A failed check leaves the operands
//! untouched and returns the error; nothing is partially applied.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::{
    context::CkksContext,
    errors::{CkksError, CkksResult},
    types::{Ciphertext, Plaintext},
};
use crate::{keys::RelinearizationKey, rings::PolyModSwitch};

/// `|a - b| <= tolerance * max(a, b)`.
pub fn scales_match(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.max(b)
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    context: Arc<CkksContext>,
    scale_tolerance: f64,
}

impl Evaluator {
    pub fn new(context: Arc<CkksContext>) -> Self {
        let scale_tolerance = context.scale_tolerance();
        Self {
            context,
            scale_tolerance,
        }
    }

    /// Overrides the relative scale tolerance `add` accepts.
    pub fn with_scale_tolerance(mut self, tolerance: f64) -> CkksResult<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(CkksError::parameter(format!(
                "scale tolerance must be finite and non-negative, got {tolerance}"
            )));
        }
        self.scale_tolerance = tolerance;
        Ok(self)
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }

    pub fn scale_tolerance(&self) -> f64 {
        self.scale_tolerance
    }

    // ─── Addition ────────────────────────────────────────────────────────────

    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> CkksResult<Ciphertext> {
        let mut out = a.clone();
        self.add_inplace(&mut out, b)?;
        Ok(out)
    }

    /// `a += b`. Levels must match and scales agree within the tolerance;
    /// the result keeps `a`'s scale.
    #[instrument(level = "debug", skip_all, fields(level = a.level, scale = a.scale))]
    pub fn add_inplace(&self, a: &mut Ciphertext, b: &Ciphertext) -> CkksResult<()> {
        self.check_binary(a, b)?;
        if !scales_match(a.scale, b.scale, self.scale_tolerance) {
            warn!(left = a.scale, right = b.scale, "add rejected: scale mismatch");
            return Err(CkksError::ScaleMismatch {
                left: a.scale,
                right: b.scale,
                tolerance: self.scale_tolerance,
            });
        }
        for (i, component) in b.components.iter().enumerate() {
            match a.components.get_mut(i) {
                Some(target) => *target += component,
                None => a.components.push(component.clone()),
            }
        }
        a.slots = a.slots.max(b.slots);
        Ok(())
    }

    // ─── Multiplication ──────────────────────────────────────────────────────

    /// Tensor product of two 2-component ciphertexts; the result has 3
    /// components and scale `a.scale * b.scale`.
    ///
    /// Fails with [`CkksError::ChainExhausted`] when the product scale does
    /// not fit below the current level's modulus. That can happen above
    /// level 0 too, when the operand scales are too large for what is left
    /// of the chain; rescale the operands first.
    #[instrument(level = "debug", skip_all, fields(level = a.level, scale = a.scale))]
    pub fn multiply(&self, a: &Ciphertext, b: &Ciphertext) -> CkksResult<Ciphertext> {
        self.check_binary(a, b)?;
        for ct in [a, b] {
            self.check_size(ct, 2, "multiply")?;
        }
        let scale = a.scale * b.scale;
        self.check_scale_fits(scale, a.level, "multiply")?;

        let (a0, a1) = (&a.components[0], &a.components[1]);
        let (b0, b1) = (&b.components[0], &b.components[1]);

        let mut d0 = a0.clone();
        d0 *= b0;
        let mut d1 = a0.clone();
        d1 *= b1;
        let mut cross = a1.clone();
        cross *= b0;
        d1 += &cross;
        let mut d2 = a1.clone();
        d2 *= b1;

        debug!(scale, "multiplied");
        Ok(Ciphertext {
            components: vec![d0, d1, d2],
            scale,
            level: a.level,
            slots: a.slots.max(b.slots),
            key_id: a.key_id,
            context: Arc::clone(&a.context),
        })
    }

    pub fn multiply_plain(&self, ct: &Ciphertext, pt: &Plaintext) -> CkksResult<Ciphertext> {
        let mut out = ct.clone();
        self.multiply_plain_inplace(&mut out, pt)?;
        Ok(out)
    }

    /// Multiplies every component by the plaintext polynomial; the component
    /// count is kept and the scales multiply.
    ///
    /// The plaintext must be at the ciphertext's level. An oversized product
    /// scale is reported as [`CkksError::ChainExhausted`], as in
    /// [`Evaluator::multiply`].
    #[instrument(level = "debug", skip_all, fields(level = ct.level, scale = ct.scale))]
    pub fn multiply_plain_inplace(&self, ct: &mut Ciphertext, pt: &Plaintext) -> CkksResult<()> {
        self.check_context(ct)?;
        if !Arc::ptr_eq(pt.context(), &self.context) {
            warn!("multiply_plain rejected: plaintext from another context");
            return Err(CkksError::ContextMismatch);
        }
        if ct.level != pt.level() {
            warn!(left = ct.level, right = pt.level(), "multiply_plain rejected: level mismatch");
            return Err(CkksError::LevelMismatch {
                left: ct.level,
                right: pt.level(),
            });
        }
        let scale = ct.scale * pt.scale();
        self.check_scale_fits(scale, ct.level, "multiply_plain")?;
        for component in ct.components.iter_mut() {
            *component *= pt.poly();
        }
        ct.scale = scale;
        Ok(())
    }

    // ─── Relinearization ─────────────────────────────────────────────────────

    pub fn relinearize(
        &self,
        ct: &Ciphertext,
        relin_key: &RelinearizationKey,
    ) -> CkksResult<Ciphertext> {
        let mut out = ct.clone();
        self.relinearize_inplace(&mut out, relin_key)?;
        Ok(out)
    }

    /// `(c0, c1, c2) -> (c0 + d0, c1 + d1)` where `(d0, d1)` is `c2`
    /// switched from `s^2` to `s`.
    #[instrument(level = "debug", skip_all, fields(level = ct.level, size = ct.size()))]
    pub fn relinearize_inplace(
        &self,
        ct: &mut Ciphertext,
        relin_key: &RelinearizationKey,
    ) -> CkksResult<()> {
        self.check_context(ct)?;
        if !Arc::ptr_eq(relin_key.context(), &self.context) || relin_key.key_id() != ct.key_id {
            warn!("relinearize rejected: key does not match ciphertext");
            return Err(CkksError::KeyMismatch {
                message: "relinearization key belongs to a different secret".into(),
            });
        }
        self.check_size(ct, 3, "relinearize")?;

        let level = self.context.level(ct.level)?;
        let (d0, d1) = relin_key.switch_key(&ct.components[2], level)?;
        ct.components.truncate(2);
        ct.components[0] += &d0;
        ct.components[1] += &d1;
        Ok(())
    }

    // ─── Rescaling and modulus switching ─────────────────────────────────────

    pub fn rescale(&self, ct: &Ciphertext) -> CkksResult<Ciphertext> {
        let mut out = ct.clone();
        self.rescale_inplace(&mut out)?;
        Ok(out)
    }

    /// Divides by `q_level` with rounding, moving one level down and dividing
    /// the scale by the same prime.
    #[instrument(level = "debug", skip_all, fields(level = ct.level, scale = ct.scale))]
    pub fn rescale_inplace(&self, ct: &mut Ciphertext) -> CkksResult<()> {
        self.check_context(ct)?;
        let level = self.context.level(ct.level)?;
        let Some(dropped) = level.dropped_modulus else {
            warn!("rescale rejected: already at level 0");
            return Err(CkksError::ChainExhausted {
                operation: "rescale",
                level: ct.level,
            });
        };
        self.check_size(ct, 2, "rescale")?;

        let components = ct
            .components
            .iter()
            .map(|c| c.divide_round_by_last())
            .collect::<Result<Vec<_>, _>>()?;
        ct.components = components;
        ct.scale /= dropped as f64;
        ct.level -= 1;
        debug!(new_level = ct.level, new_scale = ct.scale, "rescaled");
        Ok(())
    }

    pub fn mod_switch_to(&self, ct: &Ciphertext, target: usize) -> CkksResult<Ciphertext> {
        let mut out = ct.clone();
        self.mod_switch_to_inplace(&mut out, target)?;
        Ok(out)
    }

    /// Drops moduli down to `target` without touching the scale.
    #[instrument(level = "debug", skip_all, fields(level = ct.level, target))]
    pub fn mod_switch_to_inplace(&self, ct: &mut Ciphertext, target: usize) -> CkksResult<()> {
        self.check_context(ct)?;
        if target > ct.level {
            warn!("mod_switch_to rejected: target above current level");
            return Err(CkksError::InvalidLevel {
                level: target,
                max: ct.level,
            });
        }
        let drop = ct.level - target;
        if drop > 0 {
            let components = ct
                .components
                .iter()
                .map(|c| c.drop_last(drop))
                .collect::<Result<Vec<_>, _>>()?;
            ct.components = components;
            ct.level = target;
        }
        Ok(())
    }

    // ─── Scale alignment ─────────────────────────────────────────────────────

    /// Gives `b` the scale of `a` when the two differ by at most
    /// `tolerance * max(a.scale, b.scale)`.
    ///
    /// Only the nominal scale field changes; the encrypted polynomial is left
    /// as it is, so this is meant for drift accumulated by rescaling through
    /// different primes, never for a real precision mismatch.
    #[instrument(level = "debug", skip_all, fields(left = a.scale, right = b.scale, tolerance))]
    pub fn align_scale(
        &self,
        a: &Ciphertext,
        b: &Ciphertext,
        tolerance: f64,
    ) -> CkksResult<(Ciphertext, Ciphertext)> {
        let mut b = b.clone();
        self.align_scale_inplace(a, &mut b, tolerance)?;
        Ok((a.clone(), b))
    }

    pub fn align_scale_inplace(
        &self,
        a: &Ciphertext,
        b: &mut Ciphertext,
        tolerance: f64,
    ) -> CkksResult<()> {
        self.check_context(a)?;
        self.check_context(b)?;
        if !tolerance.is_finite() || tolerance < 0.0 || !scales_match(a.scale, b.scale, tolerance) {
            warn!(left = a.scale, right = b.scale, tolerance, "align_scale rejected");
            return Err(CkksError::ScaleMismatch {
                left: a.scale,
                right: b.scale,
                tolerance,
            });
        }
        b.scale = a.scale;
        Ok(())
    }

    // ─── Checks ──────────────────────────────────────────────────────────────

    fn check_context(&self, ct: &Ciphertext) -> CkksResult<()> {
        if Arc::ptr_eq(&ct.context, &self.context) {
            Ok(())
        } else {
            warn!("ciphertext from another context");
            Err(CkksError::ContextMismatch)
        }
    }

    fn check_binary(&self, a: &Ciphertext, b: &Ciphertext) -> CkksResult<()> {
        self.check_context(a)?;
        self.check_context(b)?;
        if a.key_id != b.key_id {
            warn!("operands encrypted under different keys");
            return Err(CkksError::KeyMismatch {
                message: format!("operands use keys {:#x} and {:#x}", a.key_id, b.key_id),
            });
        }
        if a.level != b.level {
            warn!(left = a.level, right = b.level, "level mismatch");
            return Err(CkksError::LevelMismatch {
                left: a.level,
                right: b.level,
            });
        }
        Ok(())
    }

    fn check_size(&self, ct: &Ciphertext, expected: usize, operation: &'static str) -> CkksResult<()> {
        if ct.size() == expected {
            Ok(())
        } else {
            warn!(operation, expected, actual = ct.size(), "wrong component count");
            Err(CkksError::State {
                operation,
                expected,
                actual: ct.size(),
            })
        }
    }

    /// The product scale has to stay below the level's modulus, otherwise the
    /// result cannot be decoded even before any rescale.
    fn check_scale_fits(&self, scale: f64, level: usize, operation: &'static str) -> CkksResult<()> {
        let data = self.context.level(level)?;
        if scale.log2() >= data.modulus_bits {
            warn!(
                operation,
                level,
                scale_bits = scale.log2(),
                modulus_bits = data.modulus_bits,
                "result scale does not fit below the level modulus"
            );
            return Err(CkksError::ChainExhausted { operation, level });
        }
        Ok(())
    }
}

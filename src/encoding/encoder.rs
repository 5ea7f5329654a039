use std::{f64::consts::PI, sync::Arc};

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use tracing::{debug, instrument, warn};

use super::SlotInput;
use crate::{
    crypto::{CkksContext, CkksError, CkksResult, Plaintext},
    rings::{PolyRing, RnsPoly},
};

/// Encoder bound to one context.
///
/// Precomputes the slot permutation induced by the rotation group `<5>` in
/// `Z_{2N}^*`, the twist factors `zeta^i` with `zeta = e^{i*pi/N}` and the
/// forward/inverse FFT plans of length N.
pub struct CkksEncoder {
    context: Arc<CkksContext>,
    // FFT index holding slot j, and the index holding its conjugate.
    slot_index: Vec<usize>,
    conj_index: Vec<usize>,
    twist: Vec<Complex64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for CkksEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CkksEncoder")
            .field("degree", &self.degree())
            .field("slots", &self.slot_index.len())
            .finish()
    }
}

impl CkksEncoder {
    pub fn new(context: Arc<CkksContext>) -> Self {
        let n = context.ring_degree();
        let m = 2 * n;
        let slots = n / 2;

        let mut slot_index = Vec::with_capacity(slots);
        let mut conj_index = Vec::with_capacity(slots);
        let mut g = 1usize;
        for _ in 0..slots {
            slot_index.push((g - 1) / 2);
            conj_index.push((m - g - 1) / 2);
            g = (g * 5) % m;
        }

        let twist = (0..n)
            .map(|i| Complex64::from_polar(1.0, PI * i as f64 / n as f64))
            .collect();

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);

        Self {
            context,
            slot_index,
            conj_index,
            twist,
            forward,
            inverse,
        }
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }

    pub fn degree(&self) -> usize {
        self.twist.len()
    }

    /// Maximum number of values that can be encoded
    pub fn slot_count(&self) -> usize {
        self.slot_index.len()
    }

    /// Encodes at the top level of the chain.
    pub fn encode<'a>(
        &self,
        values: impl Into<SlotInput<'a>>,
        scale: f64,
    ) -> CkksResult<Plaintext> {
        self.encode_at_level(values, scale, self.context.top_level())
    }

    /// Encodes `values` into a plaintext at `level` with the given scale.
    ///
    /// Unused slots are zero.
    pub fn encode_at_level<'a>(
        &self,
        values: impl Into<SlotInput<'a>>,
        scale: f64,
        level: usize,
    ) -> CkksResult<Plaintext> {
        let values = values.into();
        self.check_request(values.len(), scale, level)?;
        let coeffs = self.embed(values, scale);
        self.build_plaintext(&coeffs, scale, level, values.len())
    }

    /// Encodes the same real constant into every slot at the top level.
    pub fn encode_scalar(&self, value: f64, scale: f64) -> CkksResult<Plaintext> {
        self.encode_scalar_at_level(value, scale, self.context.top_level())
    }

    /// A constant in every slot is the constant polynomial, so no FFT is needed.
    pub fn encode_scalar_at_level(
        &self,
        value: f64,
        scale: f64,
        level: usize,
    ) -> CkksResult<Plaintext> {
        self.check_request(1, scale, level)?;
        let mut coeffs = vec![0.0; self.degree()];
        coeffs[0] = (value * scale).round();
        self.build_plaintext(&coeffs, scale, level, self.slot_count())
    }

    /// Real parts of the encoded slots.
    pub fn decode(&self, plaintext: &Plaintext) -> CkksResult<Vec<f64>> {
        Ok(self
            .decode_complex(plaintext)?
            .into_iter()
            .map(|z| z.re)
            .collect())
    }

    #[instrument(skip_all, fields(level = plaintext.level(), slots = plaintext.slots()))]
    pub fn decode_complex(&self, plaintext: &Plaintext) -> CkksResult<Vec<Complex64>> {
        if !Arc::ptr_eq(plaintext.context(), &self.context) {
            warn!("plaintext decoded with an encoder from another context");
            return Err(CkksError::ContextMismatch);
        }
        let coeffs = plaintext.poly().to_centered_f64();
        let inv_scale = plaintext.scale().recip();
        let mut buffer: Vec<Complex64> = coeffs
            .iter()
            .zip(&self.twist)
            .map(|(&c, &t)| t * (c * inv_scale))
            .collect();
        self.inverse.process(&mut buffer);

        Ok(self.slot_index[..plaintext.slots()]
            .iter()
            .map(|&k| buffer[k])
            .collect())
    }

    fn check_request(&self, len: usize, scale: f64, level: usize) -> CkksResult<()> {
        if len > self.slot_count() {
            warn!(len, max = self.slot_count(), "too many values to encode");
            return Err(CkksError::EncodingCapacity {
                got: len,
                max: self.slot_count(),
            });
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CkksError::parameter(format!(
                "scale must be finite and positive, got {scale}"
            )));
        }
        if level > self.context.top_level() {
            return Err(CkksError::InvalidLevel {
                level,
                max: self.context.top_level(),
            });
        }
        Ok(())
    }

    /// Scaled, rounded coefficients of the polynomial whose canonical
    /// embedding is `values`.
    fn embed(&self, values: SlotInput<'_>, scale: f64) -> Vec<f64> {
        let n = self.degree();
        let mut buffer = vec![Complex64::new(0.0, 0.0); n];
        for j in 0..values.len() {
            let z = values.get(j);
            buffer[self.slot_index[j]] = z;
            buffer[self.conj_index[j]] = z.conj();
        }
        self.forward.process(&mut buffer);

        let factor = scale / n as f64;
        buffer
            .iter()
            .zip(&self.twist)
            .map(|(&b, t)| ((b * t.conj()).re * factor).round())
            .collect()
    }

    fn build_plaintext(
        &self,
        coeffs: &[f64],
        scale: f64,
        level: usize,
        slots: usize,
    ) -> CkksResult<Plaintext> {
        let data = self.context.level(level)?;
        let max = coeffs.iter().fold(0.0f64, |acc, c| acc.max(c.abs()));
        let bits = if max.is_finite() { (max + 1.0).log2() } else { f64::INFINITY };
        // Centred representatives only cover half the modulus.
        let limit = data.modulus_bits - 1.0;
        if bits >= limit {
            warn!(bits, limit, level, "encoded coefficient does not fit");
            return Err(CkksError::CoefficientOutOfRange { bits, limit, level });
        }
        debug!(level, scale, slots, bits, "encoded plaintext");
        let poly = RnsPoly::from_integral_f64(coeffs, Arc::clone(&data.basis))?;
        Ok(Plaintext::new(poly, scale, level, slots, Arc::clone(&self.context)))
    }
}

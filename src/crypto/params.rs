//! Parameter sets for a CKKS context.
//!
//! The last entry of `modulus_bits` is the key-switching special prime; the
//! entries before it form the data chain `q_0 .. q_L`, bottom first.

use serde::{Deserialize, Serialize};

use super::errors::{CkksError, CkksResult};

/// Smallest supported bit-size for a single chain prime.
pub const MIN_MODULUS_BITS: u32 = 20;
/// Largest supported bit-size for a single chain prime.
pub const MAX_MODULUS_BITS: u32 = 60;

pub const DEFAULT_ERROR_STD: f64 = 3.2;
pub const DEFAULT_SCALE_TOLERANCE: f64 = 1e-9;

fn default_error_std() -> f64 {
    DEFAULT_ERROR_STD
}

fn default_scale_tolerance() -> f64 {
    DEFAULT_SCALE_TOLERANCE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CkksParameters {
    /// Ring degree N; the ring is `Z_Q[X]/(X^N + 1)` with N/2 slots.
    pub ring_degree: usize,
    /// Prime bit-sizes, bottom of the data chain first, special prime last.
    pub modulus_bits: Vec<u32>,
    /// Default encoding scale is `2^scale_bits`.
    pub scale_bits: u32,
    #[serde(default = "default_error_std")]
    pub error_std: f64,
    /// Secret-key Hamming weight; `None` means N/2.
    #[serde(default)]
    pub hamming_weight: Option<usize>,
    /// Relative tolerance `add` accepts between operand scales.
    #[serde(default = "default_scale_tolerance")]
    pub scale_tolerance: f64,
}

impl CkksParameters {
    pub fn new(ring_degree: usize, modulus_bits: Vec<u32>, scale_bits: u32) -> Self {
        Self {
            ring_degree,
            modulus_bits,
            scale_bits,
            error_std: DEFAULT_ERROR_STD,
            hamming_weight: None,
            scale_tolerance: DEFAULT_SCALE_TOLERANCE,
        }
    }

    /// N = 8192, bits {60, 40, 40, 60}, scale 2^40.
    pub fn n8192() -> Self {
        Self::new(8192, vec![60, 40, 40, 60], 40)
    }

    /// N = 4096, bits {40, 20, 40}, scale 2^20; one rescale.
    pub fn n4096() -> Self {
        Self::new(4096, vec![40, 20, 40], 20)
    }

    pub fn slot_count(&self) -> usize {
        self.ring_degree / 2
    }

    /// Index of the top data level, L.
    pub fn top_level(&self) -> usize {
        self.modulus_bits.len().saturating_sub(2)
    }

    pub fn default_scale(&self) -> f64 {
        2f64.powi(self.scale_bits as i32)
    }

    pub fn hamming_weight(&self) -> usize {
        self.hamming_weight.unwrap_or(self.ring_degree / 2)
    }

    /// Checks everything that can be checked without searching for primes.
    pub fn validate(&self) -> CkksResult<()> {
        let n = self.ring_degree;
        if n < 2 || !n.is_power_of_two() {
            return Err(CkksError::parameter(format!(
                "ring degree must be a power of two >= 2, got {n}"
            )));
        }
        if self.modulus_bits.len() < 2 {
            return Err(CkksError::parameter(format!(
                "need at least 2 modulus bit-sizes (data chain + special prime), got {}",
                self.modulus_bits.len()
            )));
        }
        if let Some(&bits) = self
            .modulus_bits
            .iter()
            .find(|b| !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(*b))
        {
            return Err(CkksError::parameter(format!(
                "modulus bit-size {bits} outside [{MIN_MODULUS_BITS}, {MAX_MODULUS_BITS}]"
            )));
        }
        let data_bits: u32 = self.modulus_bits[..self.modulus_bits.len() - 1].iter().sum();
        if self.scale_bits == 0
            || self.scale_bits > MAX_MODULUS_BITS
            || self.scale_bits >= data_bits
        {
            return Err(CkksError::parameter(format!(
                "scale bits {} must be in 1..={MAX_MODULUS_BITS} and below the {data_bits} data bits",
                self.scale_bits
            )));
        }
        if !self.error_std.is_finite() || self.error_std <= 0.0 {
            return Err(CkksError::parameter(format!(
                "error std must be finite and positive, got {}",
                self.error_std
            )));
        }
        let h = self.hamming_weight();
        if h == 0 || h > n {
            return Err(CkksError::parameter(format!(
                "hamming weight must be in 1..={n}, got {h}"
            )));
        }
        if !self.scale_tolerance.is_finite() || self.scale_tolerance < 0.0 {
            return Err(CkksError::parameter(format!(
                "scale tolerance must be finite and non-negative, got {}",
                self.scale_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for CkksParameters {
    fn default() -> Self {
        Self::n8192()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(CkksParameters::n8192().validate().is_ok());
        assert!(CkksParameters::n4096().validate().is_ok());
        assert_eq!(CkksParameters::n8192().top_level(), 2);
        assert_eq!(CkksParameters::n8192().slot_count(), 4096);
        assert_eq!(CkksParameters::n8192().hamming_weight(), 4096);
    }

    #[test]
    fn rejects_non_power_of_two_degree() {
        let params = CkksParameters::new(1000, vec![60, 40, 60], 40);
        assert!(matches!(params.validate(), Err(CkksError::Parameter { .. })));
    }

    #[test]
    fn rejects_short_chain() {
        let params = CkksParameters::new(1024, vec![60], 40);
        assert!(matches!(params.validate(), Err(CkksError::Parameter { .. })));
    }

    #[test]
    fn rejects_out_of_range_bits() {
        for bits in [vec![61, 40, 60], vec![60, 19, 60]] {
            let params = CkksParameters::new(1024, bits, 30);
            assert!(matches!(params.validate(), Err(CkksError::Parameter { .. })));
        }
    }

    #[test]
    fn rejects_scale_that_swallows_the_chain() {
        let params = CkksParameters::new(1024, vec![30, 60], 30);
        assert!(matches!(params.validate(), Err(CkksError::Parameter { .. })));
        let params = CkksParameters::new(1024, vec![30, 60], 0);
        assert!(matches!(params.validate(), Err(CkksError::Parameter { .. })));
    }

    #[test]
    fn rejects_bad_noise_and_weight() {
        let mut params = CkksParameters::new(1024, vec![60, 40, 60], 40);
        params.error_std = 0.0;
        assert!(params.validate().is_err());
        params.error_std = 3.2;
        params.hamming_weight = Some(2048);
        assert!(params.validate().is_err());
        params.hamming_weight = Some(64);
        params.scale_tolerance = f64::NAN;
        assert!(params.validate().is_err());
    }
}

use std::sync::Arc;

use super::{
    context::CkksContext,
    errors::{CkksError, CkksResult},
    params::{CkksParameters, DEFAULT_ERROR_STD, DEFAULT_SCALE_TOLERANCE},
};

/// Step-by-step construction of a [`CkksContext`].
///
/// Ring degree, modulus bit-sizes and scale bits are required; noise, Hamming
/// weight and scale tolerance fall back to the parameter defaults.
#[derive(Debug, Default, Clone)]
pub struct ContextBuilder {
    ring_degree: Option<usize>,
    modulus_bits: Option<Vec<u32>>,
    scale_bits: Option<u32>,
    error_std: Option<f64>,
    hamming_weight: Option<usize>,
    scale_tolerance: Option<f64>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing parameter set.
    pub fn from_params(params: &CkksParameters) -> Self {
        Self {
            ring_degree: Some(params.ring_degree),
            modulus_bits: Some(params.modulus_bits.clone()),
            scale_bits: Some(params.scale_bits),
            error_std: Some(params.error_std),
            hamming_weight: params.hamming_weight,
            scale_tolerance: Some(params.scale_tolerance),
        }
    }

    pub fn ring_degree(mut self, degree: usize) -> Self {
        self.ring_degree = Some(degree);
        self
    }

    pub fn modulus_bits(mut self, bits: &[u32]) -> Self {
        self.modulus_bits = Some(bits.to_vec());
        self
    }

    pub fn scale_bits(mut self, scale_bits: u32) -> Self {
        self.scale_bits = Some(scale_bits);
        self
    }

    pub fn error_std(mut self, std_dev: f64) -> Self {
        self.error_std = Some(std_dev);
        self
    }

    pub fn hamming_weight(mut self, weight: usize) -> Self {
        self.hamming_weight = Some(weight);
        self
    }

    pub fn scale_tolerance(mut self, tolerance: f64) -> Self {
        self.scale_tolerance = Some(tolerance);
        self
    }

    pub fn params(self) -> CkksResult<CkksParameters> {
        let params = CkksParameters {
            ring_degree: self
                .ring_degree
                .ok_or_else(|| CkksError::parameter("ring degree not set"))?,
            modulus_bits: self
                .modulus_bits
                .ok_or_else(|| CkksError::parameter("modulus bit-sizes not set"))?,
            scale_bits: self
                .scale_bits
                .ok_or_else(|| CkksError::parameter("scale bits not set"))?,
            error_std: self.error_std.unwrap_or(DEFAULT_ERROR_STD),
            hamming_weight: self.hamming_weight,
            scale_tolerance: self.scale_tolerance.unwrap_or(DEFAULT_SCALE_TOLERANCE),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn build(self) -> CkksResult<Arc<CkksContext>> {
        CkksContext::new(self.params()?)
    }
}

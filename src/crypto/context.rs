use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{
    builder::ContextBuilder,
    errors::{CkksError, CkksResult},
    params::CkksParameters,
};
use crate::{math::ntt_prime_chain, rings::RnsBasis};

/// Everything the evaluator needs to know about one level of the chain.
#[derive(Debug, Clone)]
pub struct LevelData {
    /// Position in the chain; 0 is terminal.
    pub chain_index: usize,
    /// Data moduli `q_0 .. q_l`.
    pub basis: Arc<RnsBasis>,
    /// Data moduli `q_0 .. q_l` followed by the special prime.
    pub key_switch_basis: Arc<RnsBasis>,
    /// `q_l`, removed by a rescale from this level; `None` at level 0.
    pub dropped_modulus: Option<u64>,
    /// `log2(q_0 * ... * q_l)`.
    pub modulus_bits: f64,
}

/// Immutable parameter context shared by every plaintext, ciphertext and key
/// created under it.
#[derive(Debug)]
pub struct CkksContext {
    params: CkksParameters,
    key_switch_basis: Arc<RnsBasis>,
    levels: Vec<LevelData>,
}

impl CkksContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Validates `params`, generates the prime chain and precomputes the
    /// per-level table.
    #[instrument(skip(params), fields(degree = params.ring_degree, bits = ?params.modulus_bits))]
    pub fn new(params: CkksParameters) -> CkksResult<Arc<Self>> {
        params.validate()?;
        let n = params.ring_degree;
        let primes = ntt_prime_chain(&params.modulus_bits, n as u64).ok_or_else(|| {
            CkksError::parameter(format!(
                "no NTT-friendly primes for bit-sizes {:?} at degree {n}",
                params.modulus_bits
            ))
        })?;
        info!(?primes, "generated modulus chain");

        let key_switch_basis = Arc::new(RnsBasis::new(n, primes.clone())?);
        let special_index = primes.len() - 1;
        let top_level = special_index - 1;

        let mut levels = Vec::with_capacity(top_level + 1);
        for level in 0..=top_level {
            let basis = Arc::new(key_switch_basis.prefix(level + 1)?);
            let mut indices: Vec<usize> = (0..=level).collect();
            indices.push(special_index);
            let ks_basis = Arc::new(key_switch_basis.select(&indices)?);
            let data = LevelData {
                chain_index: level,
                modulus_bits: basis.log2_modulus(),
                dropped_modulus: (level > 0).then(|| primes[level]),
                basis,
                key_switch_basis: ks_basis,
            };
            debug!(
                level,
                modulus_bits = data.modulus_bits,
                dropped = ?data.dropped_modulus,
                "level table entry"
            );
            levels.push(data);
        }

        Ok(Arc::new(Self {
            params,
            key_switch_basis,
            levels,
        }))
    }

    pub fn params(&self) -> &CkksParameters {
        &self.params
    }

    pub fn ring_degree(&self) -> usize {
        self.params.ring_degree
    }

    pub fn slot_count(&self) -> usize {
        self.params.slot_count()
    }

    pub fn top_level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn default_scale(&self) -> f64 {
        self.params.default_scale()
    }

    pub fn scale_tolerance(&self) -> f64 {
        self.params.scale_tolerance
    }

    /// The key-switching prime `P`.
    pub fn special_modulus(&self) -> u64 {
        let moduli = self.key_switch_basis.moduli();
        moduli[moduli.len() - 1]
    }

    /// Data moduli `q_0 .. q_L`.
    pub fn data_moduli(&self) -> &[u64] {
        let moduli = self.key_switch_basis.moduli();
        &moduli[..moduli.len() - 1]
    }

    /// `q_0 .. q_L, P`; keys live here.
    pub fn key_switch_basis(&self) -> &Arc<RnsBasis> {
        &self.key_switch_basis
    }

    pub fn levels(&self) -> &[LevelData] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> CkksResult<&LevelData> {
        self.levels.get(level).ok_or(CkksError::InvalidLevel {
            level,
            max: self.top_level(),
        })
    }
}

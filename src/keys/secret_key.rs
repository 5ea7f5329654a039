//! Secret Key (sk): Sample a "small" polynomial s(X) from R.
//! "Small" means its coefficients are chosen from {-1, 0, 1}.
use std::sync::Arc;

use rand::Rng;

use super::{KeyError, KeyResult};
use crate::{
    crypto::CkksContext,
    rings::{PolySampler, RnsBasis, RnsPoly},
};

/// Parameters for generating a secret key.
#[derive(Debug, Clone)]
pub struct SecretKeyParams {
    pub hamming_weight: usize,
}

impl SecretKeyParams {
    pub fn new(hamming_weight: usize) -> KeyResult<Self> {
        if hamming_weight == 0 {
            return Err(KeyError::InvalidHammingWeight(hamming_weight, 0));
        }
        Ok(Self { hamming_weight })
    }

    fn validate(&self, degree: usize) -> KeyResult<()> {
        if self.hamming_weight == 0 || self.hamming_weight > degree {
            Err(KeyError::InvalidHammingWeight(self.hamming_weight, degree))
        } else {
            Ok(())
        }
    }
}

/// Sparse ternary secret over the full key-switching basis `q_0 .. q_L, P`.
///
/// Every key and ciphertext derived from it carries the same `key_id`.
#[derive(Debug, Clone)]
pub struct SecretKey {
    poly: RnsPoly,
    key_id: u64,
    context: Arc<CkksContext>,
}

impl SecretKey {
    pub fn generate<R: Rng + ?Sized>(
        params: &SecretKeyParams,
        context: &Arc<CkksContext>,
        rng: &mut R,
    ) -> KeyResult<Self> {
        params.validate(context.ring_degree())?;
        let poly = RnsPoly::sample_tribits(
            params.hamming_weight,
            context.key_switch_basis(),
            rng,
        );
        Ok(Self {
            poly,
            key_id: rng.random::<u64>(),
            context: Arc::clone(context),
        })
    }

    pub fn key_id(&self) -> u64 {
        self.key_id
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }

    pub fn poly(&self) -> &RnsPoly {
        &self.poly
    }

    /// The secret reduced into `basis`, which may contain any of the
    /// context's primes.
    pub fn poly_at(&self, basis: &Arc<RnsBasis>) -> KeyResult<RnsPoly> {
        // Coefficients are in {-1, 0, 1}, so any one channel determines them.
        Ok(self.poly.lift_channel(0, Arc::clone(basis))?)
    }
}

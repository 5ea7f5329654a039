use std::sync::Arc;

use rand::Rng;
use tracing::{debug, instrument};

use super::{KeyError, KeyResult, SecretKey};
use crate::{
    crypto::{CkksContext, LevelData},
    math::modular::mul_mod,
    rings::{PolyModSwitch, PolySampler, RnsPoly},
};

/// Parameters for relinearization key generation
#[derive(Debug, Clone)]
pub struct RelinearizationKeyParams {
    /// Standard deviation for the error distribution
    pub error_std: f64,
}

impl RelinearizationKeyParams {
    pub fn new(error_std: f64) -> KeyResult<Self> {
        let params = Self { error_std };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> KeyResult<()> {
        if !self.error_std.is_finite() || self.error_std <= 0.0 {
            Err(KeyError::InvalidErrorStd(self.error_std))
        } else {
            Ok(())
        }
    }
}

/// Relinearization key: one RLWE pair per data prime over `q_0 .. q_L, P`.
///
/// Pair `j` satisfies `b_j + a_j * s = e_j + P * g_j * s^2`, where `g_j` is
/// the CRT idempotent that is 1 modulo `q_j` and 0 modulo every other prime.
/// Decomposing `c2` by its residues therefore reconstructs `P * c2 * s^2`
/// and a rounding division by `P` removes the special prime again.
#[derive(Debug, Clone)]
pub struct RelinearizationKey {
    pairs: Vec<(RnsPoly, RnsPoly)>,
    key_id: u64,
    context: Arc<CkksContext>,
}

impl RelinearizationKey {
    /// Generate a relinearization key from a secret key
    ///
    /// 1. Compute s^2 over the key-switching basis
    /// 2. For each data prime `q_j`, sample uniform `a_j` and Gaussian `e_j`
    /// 3. Set `b_j = -(a_j * s) + e_j` and add `(P mod q_j) * s^2` on channel `j` only
    #[instrument(skip_all, fields(levels = secret_key.context().top_level() + 1))]
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey,
        params: &RelinearizationKeyParams,
        rng: &mut R,
    ) -> KeyResult<Self> {
        params.validate()?;
        let context = Arc::clone(secret_key.context());
        let basis = context.key_switch_basis();
        let special = context.special_modulus();

        let s = secret_key.poly();
        let mut s_squared = s.clone();
        s_squared *= s;

        let mut pairs = Vec::with_capacity(context.data_moduli().len());
        for (j, &q_j) in context.data_moduli().iter().enumerate() {
            let a = RnsPoly::sample_uniform(basis, rng);
            let e = RnsPoly::sample_gaussian(params.error_std, basis, rng);

            let mut a_times_s = a.clone();
            a_times_s *= s;
            let mut b = -a_times_s;
            b += &e;

            let factor = special % q_j;
            let mut gadget = vec![vec![0u64; basis.degree()]; basis.channel_count()];
            gadget[j] = s_squared.channels()[j]
                .iter()
                .map(|&c| mul_mod(c, factor, q_j))
                .collect();
            b += &RnsPoly::from_channels(gadget, Arc::clone(basis))?;

            pairs.push((b, a));
        }
        debug!(pairs = pairs.len(), "relinearization key generated");

        Ok(Self {
            pairs,
            key_id: secret_key.key_id(),
            context,
        })
    }

    pub fn key_id(&self) -> u64 {
        self.key_id
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }

    /// Switches `c2`, encrypted under `s^2`, to a pair `(d0, d1)` with
    /// `d0 + d1 * s = c2 * s^2 + small` over the level's data basis.
    pub fn switch_key(&self, c2: &RnsPoly, level: &LevelData) -> KeyResult<(RnsPoly, RnsPoly)> {
        if c2.basis().as_ref() != level.basis.as_ref() {
            return Err(KeyError::ContextMismatch);
        }
        let ks_basis = &level.key_switch_basis;
        let mut acc_b = RnsPoly::zero(Arc::clone(ks_basis));
        let mut acc_a = RnsPoly::zero(Arc::clone(ks_basis));

        for (j, (b, a)) in self.pairs.iter().take(level.chain_index + 1).enumerate() {
            let digit = c2.lift_channel(j, Arc::clone(ks_basis))?;
            let mut term_b = digit.clone();
            term_b *= &b.restrict_to(Arc::clone(ks_basis))?;
            acc_b += &term_b;
            let mut term_a = digit;
            term_a *= &a.restrict_to(Arc::clone(ks_basis))?;
            acc_a += &term_a;
        }

        Ok((acc_b.divide_round_by_last()?, acc_a.divide_round_by_last()?))
    }
}

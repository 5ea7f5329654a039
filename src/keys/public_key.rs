use std::sync::Arc;

use rand::Rng;

use super::{KeyError, KeyResult, SecretKey};
use crate::{
    crypto::CkksContext,
    rings::{PolySampler, RnsBasis, RnsPoly, PolyModSwitch},
};

/// Parameters for generating a public key.
#[derive(Debug, Clone)]
pub struct PublicKeyParams {
    /// Standard deviation for the error distribution
    pub error_std: f64,
}

impl PublicKeyParams {
    pub fn new(error_std: f64) -> KeyResult<Self> {
        let params = Self { error_std };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> KeyResult<()> {
        if !self.error_std.is_finite() || self.error_std <= 0.0 {
            Err(KeyError::InvalidErrorStd(self.error_std))
        } else {
            Ok(())
        }
    }
}

/// RLWE public key over the top data basis.
#[derive(Debug, Clone)]
pub struct PublicKey {
    /// "b" component: b = -(a * s) + e
    b: RnsPoly,
    /// "a" component: uniformly random
    a: RnsPoly,
    key_id: u64,
    context: Arc<CkksContext>,
}

impl PublicKey {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey,
        params: &PublicKeyParams,
        rng: &mut R,
    ) -> KeyResult<Self> {
        params.validate()?;
        let context = Arc::clone(secret_key.context());
        let top = context
            .level(context.top_level())
            .map_err(|_| KeyError::ContextMismatch)?;
        let basis = &top.basis;

        let a = RnsPoly::sample_uniform(basis, rng);
        let e = RnsPoly::sample_gaussian(params.error_std, basis, rng);

        // b = -(a * s) + e
        let mut a_times_s = a.clone();
        a_times_s *= &secret_key.poly_at(basis)?;
        let mut b = -a_times_s;
        b += &e;

        Ok(Self {
            b,
            a,
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

    /// `(b, a)` reduced to a lower data basis.
    pub fn components_at(&self, basis: &Arc<RnsBasis>) -> KeyResult<(RnsPoly, RnsPoly)> {
        let drop = self
            .b
            .basis()
            .channel_count()
            .checked_sub(basis.channel_count())
            .ok_or(KeyError::ContextMismatch)?;
        if drop == 0 {
            return Ok((self.b.clone(), self.a.clone()));
        }
        Ok((self.b.drop_last(drop)?, self.a.drop_last(drop)?))
    }
}

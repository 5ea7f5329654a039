use std::sync::Arc;

use rand::Rng;
use tracing::info;

use super::{
    builder::ContextBuilder,
    context::CkksContext,
    errors::CkksResult,
    evaluator::Evaluator,
    operations,
    params::CkksParameters,
    types::{Ciphertext, Plaintext},
};
use crate::{
    encoding::CkksEncoder,
    keys::{
        PublicKey, PublicKeyParams, RelinearizationKey, RelinearizationKeyParams,
        SecretKey, SecretKeyParams,
    },
};

/// Every key generated from one secret.
#[derive(Debug, Clone)]
pub struct KeySet {
    pub secret: SecretKey,
    pub public: PublicKey,
    pub relin: RelinearizationKey,
}

/// One entry point owning the context and handing out encoders, evaluators
/// and keys bound to it.
#[derive(Debug, Clone)]
pub struct CkksEngine {
    context: Arc<CkksContext>,
}

impl CkksEngine {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn new(params: CkksParameters) -> CkksResult<Self> {
        Ok(Self::from_context(CkksContext::new(params)?))
    }

    pub fn from_context(context: Arc<CkksContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }

    pub fn encoder(&self) -> CkksEncoder {
        CkksEncoder::new(Arc::clone(&self.context))
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(Arc::clone(&self.context))
    }

    pub fn generate_secret_key<R: Rng + ?Sized>(&self, rng: &mut R) -> CkksResult<SecretKey> {
        let sk_params = SecretKeyParams::new(self.context.params().hamming_weight())?;
        Ok(SecretKey::generate(&sk_params, &self.context, rng)?)
    }

    pub fn generate_public_key<R: Rng + ?Sized>(
        &self,
        secret_key: &SecretKey,
        rng: &mut R,
    ) -> CkksResult<PublicKey> {
        let pk_params = PublicKeyParams::new(self.context.params().error_std)?;
        Ok(PublicKey::generate(secret_key, &pk_params, rng)?)
    }

    /// Generate a relinearization key for ciphertext multiplication
    ///
    /// The relinearization key converts the 3-component ciphertexts produced
    /// by multiplication back to 2 components while preserving the plaintext.
    pub fn generate_relinearization_key<R: Rng + ?Sized>(
        &self,
        secret_key: &SecretKey,
        rng: &mut R,
    ) -> CkksResult<RelinearizationKey> {
        let relin_params = RelinearizationKeyParams::new(self.context.params().error_std)?;
        Ok(RelinearizationKey::generate(secret_key, &relin_params, rng)?)
    }

    pub fn generate_keys<R: Rng + ?Sized>(&self, rng: &mut R) -> CkksResult<KeySet> {
        let secret = self.generate_secret_key(rng)?;
        let public = self.generate_public_key(&secret, rng)?;
        let relin = self.generate_relinearization_key(&secret, rng)?;
        info!(key_id = secret.key_id(), "generated key set");
        Ok(KeySet {
            secret,
            public,
            relin,
        })
    }

    // Encryption/Decryption
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        plaintext: &Plaintext,
        public_key: &PublicKey,
        rng: &mut R,
    ) -> CkksResult<Ciphertext> {
        operations::encrypt(plaintext, public_key, rng)
    }

    pub fn decrypt(&self, ciphertext: &Ciphertext, secret_key: &SecretKey) -> CkksResult<Plaintext> {
        operations::decrypt(ciphertext, secret_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn engine_round_trip() {
        let engine = CkksEngine::new(CkksParameters::new(64, vec![50, 30, 50], 30)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let keys = engine.generate_keys(&mut rng).unwrap();
        assert_eq!(keys.public.key_id(), keys.secret.key_id());
        assert_eq!(keys.relin.key_id(), keys.secret.key_id());

        let encoder = engine.encoder();
        let scale = engine.context().default_scale();
        let pt = encoder.encode(&[0.25, -8.0], scale).unwrap();
        let ct = engine.encrypt(&pt, &keys.public, &mut rng).unwrap();
        let decoded = encoder.decode(&engine.decrypt(&ct, &keys.secret).unwrap()).unwrap();
        assert_abs_diff_eq!(decoded[0], 0.25, epsilon = 1e-4);
        assert_abs_diff_eq!(decoded[1], -8.0, epsilon = 1e-4);
    }

    #[test]
    fn engine_builder_builds_context() {
        let ctx = CkksEngine::builder()
            .ring_degree(64)
            .modulus_bits(&[50, 30, 50])
            .scale_bits(30)
            .build()
            .unwrap();
        let engine = CkksEngine::from_context(ctx);
        assert_eq!(engine.evaluator().context().top_level(), 1);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shared_state_is_send_and_sync() {
        assert_send_sync::<crate::crypto::CkksContext>();
        assert_send_sync::<CkksEngine>();
        assert_send_sync::<crate::encoding::CkksEncoder>();
        assert_send_sync::<crate::crypto::Evaluator>();
        assert_send_sync::<crate::keys::SecretKey>();
        assert_send_sync::<crate::keys::PublicKey>();
        assert_send_sync::<crate::keys::RelinearizationKey>();
        assert_send_sync::<KeySet>();
        assert_send_sync::<crate::crypto::Plaintext>();
        assert_send_sync::<crate::crypto::Ciphertext>();
    }
}

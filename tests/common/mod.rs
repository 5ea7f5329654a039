#![allow(dead_code)]

use std::sync::Arc;

use leveled_ckks::{
    Ciphertext, CkksEncoder, CkksEngine, CkksParameters, Evaluator, KeySet, decrypt, encrypt,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

pub const SCALE: f64 = 1073741824.0; // 2^30

/// N = 64, data chain {50, 30, 30}, special prime 50 bits: top level 2.
pub fn small_params() -> CkksParameters {
    CkksParameters::new(64, vec![50, 30, 30, 50], 30)
}

pub struct Fixture {
    pub engine: CkksEngine,
    pub encoder: CkksEncoder,
    pub evaluator: Evaluator,
    pub keys: KeySet,
    pub rng: ChaCha20Rng,
}

impl Fixture {
    pub fn new(params: CkksParameters, seed: u64) -> Self {
        let engine = CkksEngine::new(params).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let keys = engine.generate_keys(&mut rng).unwrap();
        Self {
            encoder: engine.encoder(),
            evaluator: engine.evaluator(),
            engine,
            keys,
            rng,
        }
    }

    pub fn small(seed: u64) -> Self {
        Self::new(small_params(), seed)
    }

    pub fn encrypt_at(&mut self, values: &[f64], scale: f64, level: usize) -> Ciphertext {
        let pt = self.encoder.encode_at_level(values, scale, level).unwrap();
        encrypt(&pt, &self.keys.public, &mut self.rng).unwrap()
    }

    pub fn encrypt(&mut self, values: &[f64]) -> Ciphertext {
        let top = self.engine.context().top_level();
        self.encrypt_at(values, SCALE, top)
    }

    pub fn decrypt(&self, ct: &Ciphertext) -> Vec<f64> {
        self.encoder
            .decode(&decrypt(ct, &self.keys.secret).unwrap())
            .unwrap()
    }

    pub fn context(&self) -> &Arc<leveled_ckks::CkksContext> {
        self.engine.context()
    }

    /// multiply -> relinearize -> rescale
    pub fn square(&self, ct: &Ciphertext) -> leveled_ckks::CkksResult<Ciphertext> {
        let product = self.evaluator.multiply(ct, ct)?;
        let relin = self.evaluator.relinearize(&product, &self.keys.relin)?;
        self.evaluator.rescale(&relin)
    }
}

pub fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert!(actual.len() >= expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "slot {i}: got {a}, expected {e} (tolerance {tolerance})"
        );
    }
}

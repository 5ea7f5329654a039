mod common;

use std::sync::OnceLock;

use common::{SCALE, small_params};
use leveled_ckks::{CkksEncoder, CkksEngine, Evaluator, KeySet, decrypt, encrypt};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

struct Shared {
    encoder: CkksEncoder,
    evaluator: Evaluator,
    keys: KeySet,
    top_level: usize,
}

fn shared() -> &'static Shared {
    static SHARED: OnceLock<Shared> = OnceLock::new();
    SHARED.get_or_init(|| {
        let engine = CkksEngine::new(small_params()).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
        let keys = engine.generate_keys(&mut rng).unwrap();
        Shared {
            encoder: engine.encoder(),
            evaluator: engine.evaluator(),
            top_level: engine.context().top_level(),
            keys,
        }
    })
}

fn slot_values(range: std::ops::Range<f64>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(range, 1..=32)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn decrypt_recovers_encrypted_slots(
        values in slot_values(-100.0..100.0),
        level in 0usize..=2,
        seed in any::<u64>(),
    ) {
        let s = shared();
        prop_assume!(level <= s.top_level);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let pt = s.encoder.encode_at_level(&values, SCALE, level).unwrap();
        let ct = encrypt(&pt, &s.keys.public, &mut rng).unwrap();
        prop_assert_eq!(ct.level(), level);
        prop_assert_eq!(ct.slots(), values.len());

        let decoded = s.encoder.decode(&decrypt(&ct, &s.keys.secret).unwrap()).unwrap();
        prop_assert_eq!(decoded.len(), values.len());
        for (got, want) in decoded.iter().zip(&values) {
            prop_assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
        }
    }

    #[test]
    fn homomorphic_add_matches_slotwise_sum(
        pair in (1usize..=32).prop_flat_map(|len| (
            prop::collection::vec(-50.0f64..50.0, len),
            prop::collection::vec(-50.0f64..50.0, len),
        )),
        seed in any::<u64>(),
    ) {
        let s = shared();
        let (a, b) = pair;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let ca = encrypt(&s.encoder.encode(&a, SCALE).unwrap(), &s.keys.public, &mut rng).unwrap();
        let cb = encrypt(&s.encoder.encode(&b, SCALE).unwrap(), &s.keys.public, &mut rng).unwrap();

        let sum = s.evaluator.add(&ca, &cb).unwrap();
        prop_assert_eq!(sum.scale(), ca.scale());
        let decoded = s.encoder.decode(&decrypt(&sum, &s.keys.secret).unwrap()).unwrap();
        for ((got, x), y) in decoded.iter().zip(&a).zip(&b) {
            prop_assert!((got - (x + y)).abs() < 1e-3, "got {got}, want {}", x + y);
        }
    }

    #[test]
    fn square_and_rescale_matches_slotwise_square(
        values in slot_values(-4.0..4.0),
        seed in any::<u64>(),
    ) {
        let s = shared();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let ct = encrypt(&s.encoder.encode(&values, SCALE).unwrap(), &s.keys.public, &mut rng).unwrap();

        let product = s.evaluator.multiply(&ct, &ct).unwrap();
        let relin = s.evaluator.relinearize(&product, &s.keys.relin).unwrap();
        let squared = s.evaluator.rescale(&relin).unwrap();
        prop_assert_eq!(squared.level(), ct.level() - 1);

        let decoded = s.encoder.decode(&decrypt(&squared, &s.keys.secret).unwrap()).unwrap();
        for (got, x) in decoded.iter().zip(&values) {
            prop_assert!((got - x * x).abs() < 1e-2, "got {got}, want {}", x * x);
        }
    }
}

use leveled_ckks::{CkksContext, CkksEngine, CkksError, CkksParameters, ContextBuilder};

fn is_parameter_error<T: std::fmt::Debug>(result: Result<T, CkksError>) -> bool {
    matches!(result, Err(CkksError::Parameter { .. }))
}

#[test]
fn json_parameters_fill_in_defaults() {
    let json = r#"{ "ring_degree": 64, "modulus_bits": [50, 30, 30, 50], "scale_bits": 30 }"#;
    let params: CkksParameters = serde_json::from_str(json).unwrap();
    assert_eq!(params, CkksParameters::new(64, vec![50, 30, 30, 50], 30));
    assert_eq!(params.error_std, 3.2);
    assert_eq!(params.hamming_weight, None);
    assert_eq!(params.hamming_weight(), 32);
    assert_eq!(params.scale_tolerance, 1e-9);
    assert_eq!(params.top_level(), 2);
    assert_eq!(params.slot_count(), 32);
}

#[test]
fn parameters_survive_a_json_round_trip() {
    let mut params = CkksParameters::n4096();
    params.hamming_weight = Some(64);
    params.scale_tolerance = 1e-6;
    let text = serde_json::to_string(&params).unwrap();
    let back: CkksParameters = serde_json::from_str(&text).unwrap();
    assert_eq!(back, params);
}

#[test]
fn default_parameters_are_the_n8192_chain() {
    let params = CkksParameters::default();
    assert_eq!(params.ring_degree, 8192);
    assert_eq!(params.modulus_bits, vec![60, 40, 40, 60]);
    assert_eq!(params.default_scale(), 2f64.powi(40));
    assert!(params.validate().is_ok());
}

#[test]
fn malformed_parameter_sets_are_rejected() {
    let cases = [
        CkksParameters::new(100, vec![50, 30, 50], 30),
        CkksParameters::new(64, vec![50], 30),
        CkksParameters::new(64, vec![61, 30, 50], 30),
        CkksParameters::new(64, vec![50, 19, 50], 30),
        CkksParameters::new(64, vec![30, 50], 30),
        CkksParameters::new(64, vec![50, 30, 50], 0),
        CkksParameters {
            error_std: -1.0,
            ..CkksParameters::new(64, vec![50, 30, 50], 30)
        },
        CkksParameters {
            hamming_weight: Some(65),
            ..CkksParameters::new(64, vec![50, 30, 50], 30)
        },
        CkksParameters {
            scale_tolerance: f64::NAN,
            ..CkksParameters::new(64, vec![50, 30, 50], 30)
        },
    ];
    for params in cases {
        assert!(
            is_parameter_error(params.validate()),
            "accepted {params:?}"
        );
        assert!(is_parameter_error(CkksContext::new(params)));
    }
}

#[test]
fn unsatisfiable_prime_chain_is_a_parameter_error() {
    // Only one 20-bit prime is 1 mod 2N at this degree.
    let params = CkksParameters::new(32768, vec![20, 20, 20], 10);
    assert!(params.validate().is_ok());
    assert!(is_parameter_error(CkksContext::new(params)));
}

#[test]
fn builder_requires_the_core_fields() {
    assert!(is_parameter_error(ContextBuilder::new().params()));
    assert!(is_parameter_error(
        ContextBuilder::new().ring_degree(64).scale_bits(30).params()
    ));
}

#[test]
fn builder_matches_explicit_parameters() {
    let context = CkksEngine::builder()
        .ring_degree(64)
        .modulus_bits(&[50, 30, 30, 50])
        .scale_bits(30)
        .hamming_weight(16)
        .build()
        .unwrap();
    assert_eq!(context.params().hamming_weight(), 16);
    assert_eq!(context.top_level(), 2);
    assert_eq!(context.data_moduli().len(), 3);
    assert_eq!(context.levels().len(), 3);

    let data = context.data_moduli();
    let special = context.special_modulus();
    assert!(data.iter().all(|&q| q != special));
    for (q, bits) in data.iter().zip([50u32, 30, 30]) {
        assert_eq!(64 - q.leading_zeros(), bits);
        assert_eq!(q % 128, 1);
    }
}

#[test]
fn level_table_records_dropped_primes() {
    let context = CkksContext::new(CkksParameters::new(64, vec![50, 30, 30, 50], 30)).unwrap();
    let data = context.data_moduli().to_vec();
    assert_eq!(context.level(0).unwrap().dropped_modulus, None);
    assert_eq!(context.level(1).unwrap().dropped_modulus, Some(data[1]));
    assert_eq!(context.level(2).unwrap().dropped_modulus, Some(data[2]));
    assert!(context.level(1).unwrap().modulus_bits > 79.0);
    assert_eq!(
        context.level(3).err(),
        Some(CkksError::InvalidLevel { level: 3, max: 2 })
    );
}

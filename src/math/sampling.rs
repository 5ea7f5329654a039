use rand::{Rng, seq::SliceRandom};
use rand_distr::{Distribution, Normal, uniform::Uniform};

/// Samples `degree` uniform integer coefficients in `[0, max_value)`.
///
/// # Panics
///
/// Panics if `max_value == 0`.
pub fn uniform_coefficients<R: Rng + ?Sized>(
    degree: usize,
    max_value: u64,
    rng: &mut R,
) -> Vec<u64> {
    let distribution = Uniform::new(0, max_value).unwrap_or_else(|_| {
        panic!(
            "uniform_coefficients: invalid range [0, {max_value}), \
            max_value must be positive"
        )
    });
    (0..degree).map(|_| distribution.sample(rng)).collect()
}

/// Samples `degree` rounded Gaussian integers centred at zero.
///
/// The result is signed; callers reduce it into each RNS channel.
///
/// # Panics
///
/// Panics if `std_dev` is not finite and positive.
pub fn gaussian_coefficients<R: Rng + ?Sized>(
    degree: usize,
    std_dev: f64,
    rng: &mut R,
) -> Vec<i64> {
    assert!(
        std_dev.is_finite() && std_dev > 0.0,
        "gaussian_coefficients: std_dev must be finite and positive"
    );
    let normal = Normal::new(0.0, std_dev).unwrap_or_else(|_| {
        panic!("gaussian_coefficients: invalid std_dev {std_dev}")
    });
    (0..degree)
        .map(|_| normal.sample(rng).round() as i64)
        .collect()
}

/// Samples a ternary vector with coefficients in `{-1, 0, 1}`.
///
/// Exactly `hamming_weight` entries are non-zero.
///
/// # Panics
///
/// Panics if `hamming_weight > degree`.
pub fn ternary_coefficients<R: Rng + ?Sized>(
    degree: usize,
    hamming_weight: usize,
    rng: &mut R,
) -> Vec<i64> {
    assert!(
        hamming_weight <= degree,
        "ternary_coefficients: hamming_weight must be <= degree"
    );
    let mut out = vec![0i64; degree];
    // Shuffle indices and assign signs on the selected support.
    let mut indices: Vec<usize> = (0..degree).collect();
    indices.shuffle(rng);
    for &idx in indices.iter().take(hamming_weight) {
        out[idx] = if rng.random_bool(0.5) { 1 } else { -1 };
    }
    out
}

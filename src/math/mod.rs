pub mod modular;
pub mod primes;
pub mod sampling;

pub use modular::{add_mod, mod_inverse, mod_pow, mul_mod, neg_mod, sub_mod};
pub use primes::{is_ntt_friendly_prime, is_prime, ntt_prime_chain};
pub use sampling::{
    gaussian_coefficients, ternary_coefficients, uniform_coefficients,
};

pub mod public_key;
pub mod relin_key;
pub mod secret_key;

use thiserror::Error;

pub use public_key::{PublicKey, PublicKeyParams};
pub use relin_key::{RelinearizationKey, RelinearizationKeyParams};
pub use secret_key::{SecretKey, SecretKeyParams};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeyError {
    #[error("Hamming weight {0} must be in 1..={1}")]
    InvalidHammingWeight(usize, usize),
    #[error("Invalid error standard deviation: {0} (must be finite and positive)")]
    InvalidErrorStd(f64),
    #[error("Key belongs to a different context")]
    ContextMismatch,
    #[error("Ring arithmetic failed: {0}")]
    Ring(#[from] crate::rings::RingError),
}

pub type KeyResult<T> = Result<T, KeyError>;

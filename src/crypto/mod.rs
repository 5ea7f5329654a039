//! High-level CKKS operations
//!
//! Parameter handling and the shared context, encryption and decryption, the
//! evaluator and the alignment policy built on top of it.

pub mod alignment;
pub mod builder;
pub mod context;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod operations;
pub mod params;
pub mod types;

// Re-export the main types users need
pub use alignment::AlignmentPolicy;
pub use builder::ContextBuilder;
pub use context::{CkksContext, LevelData};
pub use engine::{CkksEngine, KeySet};
pub use errors::{CkksError, CkksResult};
pub use evaluator::{Evaluator, scales_match};
pub use operations::{decrypt, encrypt};
pub use params::{CkksParameters, MAX_MODULUS_BITS, MIN_MODULUS_BITS};
pub use types::{Ciphertext, Plaintext};

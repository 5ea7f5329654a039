//! Leveled CKKS: approximate arithmetic on encrypted real and complex vectors
//! with explicit scale and level tracking.

pub mod crypto;
pub mod encoding;
pub mod keys;
pub mod math;
pub mod rings;

pub use crypto::{
    AlignmentPolicy, Ciphertext, CkksContext, CkksEngine, CkksError, CkksParameters,
    CkksResult, ContextBuilder, Evaluator, KeySet, LevelData, Plaintext, decrypt, encrypt,
};
pub use encoding::{CkksEncoder, SlotInput};
pub use num_complex::Complex64;
pub use keys::{KeyError, PublicKey, RelinearizationKey, SecretKey};
pub use rings::{PolyModSwitch, PolyRing, PolySampler, RingError, RnsBasis, RnsPoly};

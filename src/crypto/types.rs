use std::sync::Arc;

use super::context::CkksContext;
use crate::rings::RnsPoly;

/// Encoded message: one polynomial over a level's data basis, plus the
/// metadata needed to interpret it.
#[derive(Debug, Clone)]
pub struct Plaintext {
    poly: RnsPoly,
    scale: f64,
    level: usize,
    slots: usize, // Number of encoded slots (determines decode output length)
    context: Arc<CkksContext>,
}

impl Plaintext {
    pub(crate) fn new(
        poly: RnsPoly,
        scale: f64,
        level: usize,
        slots: usize,
        context: Arc<CkksContext>,
    ) -> Self {
        Self {
            poly,
            scale,
            level,
            slots,
            context,
        }
    }

    pub fn poly(&self) -> &RnsPoly {
        &self.poly
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }
}

impl PartialEq for Plaintext {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.context, &other.context)
            && self.level == other.level
            && self.scale == other.scale
            && self.slots == other.slots
            && self.poly == other.poly
    }
}

/// CKKS ciphertext with explicit scale and level tracking.
///
/// Holds 2 components `(c0, c1)` normally and 3 `(c0, c1, c2)` between a
/// multiply and the following relinearization; decryption computes
/// `c0 + c1*s (+ c2*s^2)`.
///
/// - **Modulus switching** drops moduli: only `level` changes.
/// - **Rescaling** divides by `q_level`: both `scale` and `level` change.
#[derive(Debug, Clone)]
pub struct Ciphertext {
    pub(crate) components: Vec<RnsPoly>,
    pub(crate) scale: f64,
    pub(crate) level: usize,
    pub(crate) slots: usize,
    pub(crate) key_id: u64,
    pub(crate) context: Arc<CkksContext>,
}

impl Ciphertext {
    pub fn components(&self) -> &[RnsPoly] {
        &self.components
    }

    /// 2 after encryption or relinearization, 3 after a multiply.
    pub fn size(&self) -> usize {
        self.components.len()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Identifier of the secret key this ciphertext decrypts under.
    pub fn key_id(&self) -> u64 {
        self.key_id
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }
}

impl PartialEq for Ciphertext {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.context, &other.context)
            && self.key_id == other.key_id
            && self.level == other.level
            && self.scale == other.scale
            && self.slots == other.slots
            && self.components == other.components
    }
}

//! CKKS encryption and decryption.
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, instrument, warn};

use super::{
    errors::{CkksError, CkksResult},
    types::{Ciphertext, Plaintext},
};
use crate::{
    keys::{PublicKey, SecretKey},
    rings::{PolySampler, RnsPoly},
};

/// Encrypts a plaintext under a public key, at the plaintext's level and scale.
///
/// # CKKS Encryption Process
/// 1. Sample an ephemeral ternary polynomial `u`
/// 2. Sample error polynomials `e0` and `e1` from the Gaussian distribution
/// 3. Compute:
///    - `c0 = pk.b * u + e0 + m`
///    - `c1 = pk.a * u + e1`
///
/// The result satisfies `c0 + c1 * s = m + small` over the level's modulus.
#[instrument(skip_all, fields(level = plaintext.level(), scale = plaintext.scale()))]
pub fn encrypt<R: Rng + ?Sized>(
    plaintext: &Plaintext,
    public_key: &PublicKey,
    rng: &mut R,
) -> CkksResult<Ciphertext> {
    let context = plaintext.context();
    if !Arc::ptr_eq(context, public_key.context()) {
        warn!("public key and plaintext come from different contexts");
        return Err(CkksError::ContextMismatch);
    }
    let params = context.params();
    let basis = plaintext.poly().basis();
    let (b, a) = public_key.components_at(basis)?;

    let u = RnsPoly::sample_tribits(params.hamming_weight(), basis, rng);
    let e0 = RnsPoly::sample_gaussian(params.error_std, basis, rng);
    let e1 = RnsPoly::sample_gaussian(params.error_std, basis, rng);

    let mut c0 = b;
    c0 *= &u;
    c0 += &e0;
    c0 += plaintext.poly();

    let mut c1 = a;
    c1 *= &u;
    c1 += &e1;

    debug!("encrypted plaintext");
    Ok(Ciphertext {
        components: vec![c0, c1],
        scale: plaintext.scale(),
        level: plaintext.level(),
        slots: plaintext.slots(),
        key_id: public_key.key_id(),
        context: Arc::clone(context),
    })
}

/// Decrypts with `c0 + c1 * s (+ c2 * s^2)`.
///
/// A key from another context, or from another secret under the same
/// context, is rejected with [`CkksError::KeyMismatch`] instead of producing
/// a meaningless plaintext.
#[instrument(skip_all, fields(level = ciphertext.level(), size = ciphertext.size()))]
pub fn decrypt(ciphertext: &Ciphertext, secret_key: &SecretKey) -> CkksResult<Plaintext> {
    if !Arc::ptr_eq(ciphertext.context(), secret_key.context()) {
        warn!("secret key from another context");
        return Err(CkksError::KeyMismatch {
            message: "secret key was generated under a different context".into(),
        });
    }
    if ciphertext.key_id() != secret_key.key_id() {
        warn!(
            ciphertext_key = ciphertext.key_id(),
            secret_key = secret_key.key_id(),
            "secret key does not match ciphertext"
        );
        return Err(CkksError::KeyMismatch {
            message: format!(
                "ciphertext is encrypted under key {:#x}, got key {:#x}",
                ciphertext.key_id(),
                secret_key.key_id()
            ),
        });
    }

    let components = ciphertext.components();
    let s = secret_key.poly_at(components[0].basis())?;
    // Horner: ((c_k * s + c_{k-1}) * s + ...) + c0
    let mut result = components[components.len() - 1].clone();
    for component in components[..components.len() - 1].iter().rev() {
        result *= &s;
        result += component;
    }

    Ok(Plaintext::new(
        result,
        ciphertext.scale(),
        ciphertext.level(),
        ciphertext.slots(),
        Arc::clone(ciphertext.context()),
    ))
}

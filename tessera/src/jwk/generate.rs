use crate::{error, jwa};

use super::{Jwk, KeyId, KeyParameters};

/// Modulus size of generated RSA keys
const RSA_KEY_BITS: u32 = 2048;

impl Jwk {
    /// Generates a new signing key for the algorithm
    ///
    /// The key is marked for signature use and restricted to `alg`. ECDSA keys
    /// are generated on the algorithm's curve.
    ///
    /// # Errors
    ///
    /// The algorithm is `none`, or the key material could not be generated.
    pub fn generate(alg: jwa::Algorithm) -> Result<Self, error::KeyGenerationError> {
        let key: KeyParameters = match alg.family() {
            jwa::Family::None => return Err(error::unsupported_algorithm(alg).into()),
            jwa::Family::Hmac => jwa::hmac::Octet::generate(alg)?.into(),
            jwa::Family::RsaPkcs1 | jwa::Family::RsaPss => {
                jwa::rsa::PrivateKey::generate(RSA_KEY_BITS)?.into()
            }
            jwa::Family::Ecdsa => {
                let curve = alg
                    .curve()
                    .ok_or_else(|| error::unsupported_algorithm(alg))?;
                jwa::ec::PrivateKey::generate(curve)?.into()
            }
        };

        Ok(Self {
            usage: Some(jwa::Usage::Signing),
            algorithm: Some(alg),
            ..Self::from(key)
        })
    }

    /// Generates a new signing key for the algorithm with the given key ID
    ///
    /// # Errors
    ///
    /// Same conditions as [`generate()`][Self::generate()].
    pub fn generate_with_key_id(
        alg: jwa::Algorithm,
        kid: impl Into<KeyId>,
    ) -> Result<Self, error::KeyGenerationError> {
        Ok(Self::generate(alg)?.with_key_id(kid))
    }
}

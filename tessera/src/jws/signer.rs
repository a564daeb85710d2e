use std::fmt;

use tessera_base64::Base64Url;

use crate::{
    error,
    jwa::{self, KeyOperation},
    jwk::KeyParameters,
    Jwk,
};

/// Produces JWS signatures with a single algorithm
pub trait Signer: fmt::Debug {
    /// The algorithm this signer produces signatures for
    fn algorithm(&self) -> jwa::Algorithm;

    /// Signs `message` with `key`
    ///
    /// # Errors
    ///
    /// The key is not of the shape the algorithm requires, its `use`,
    /// `key_ops`, or `alg` forbid this use, or the cryptographic backend
    /// rejects it.
    fn sign(&self, message: &[u8], key: &Jwk) -> Result<Base64Url, error::SigningError>;
}

/// Creates the signer for an algorithm
///
/// # Errors
///
/// The algorithm is `none`.
pub fn create_signer(
    alg: jwa::Algorithm,
) -> Result<Box<dyn Signer + Send + Sync>, error::UnsupportedAlgorithm> {
    match alg.family() {
        jwa::Family::Hmac => Ok(Box::new(HmacSigner { alg })),
        jwa::Family::RsaPkcs1 | jwa::Family::RsaPss => Ok(Box::new(RsaSigner { alg })),
        jwa::Family::Ecdsa => Ok(Box::new(EcdsaSigner { alg })),
        jwa::Family::None => Err(error::unsupported_algorithm(alg)),
    }
}

fn signed(alg: jwa::Algorithm, key: &Jwk, signature: Vec<u8>) -> Base64Url {
    tracing::trace!(%alg, kid = ?key.key_id(), "produced signature");
    Base64Url::from_raw(signature)
}

fn check_family(
    alg: jwa::Algorithm,
    family: jwa::Family,
) -> Result<(), error::UnsupportedAlgorithm> {
    if alg.family() == family {
        Ok(())
    } else {
        Err(error::unsupported_algorithm(alg))
    }
}

/// HMAC signer over an `oct` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmacSigner {
    alg: jwa::Algorithm,
}

impl HmacSigner {
    /// A signer for an HMAC algorithm
    ///
    /// # Errors
    ///
    /// The algorithm is not an HMAC algorithm.
    pub fn new(alg: jwa::Algorithm) -> Result<Self, error::UnsupportedAlgorithm> {
        check_family(alg, jwa::Family::Hmac)?;
        Ok(Self { alg })
    }
}

impl Signer for HmacSigner {
    fn algorithm(&self) -> jwa::Algorithm {
        self.alg
    }

    fn sign(&self, message: &[u8], key: &Jwk) -> Result<Base64Url, error::SigningError> {
        let KeyParameters::Octet(secret) = key.key_parameters() else {
            return Err(error::key_mismatch(self.alg, key.classify()).into());
        };
        key.ensure_usable(self.alg, KeyOperation::Sign)?;

        let digest = self
            .alg
            .digest()
            .ok_or_else(|| error::unsupported_algorithm(self.alg))?;

        Ok(signed(self.alg, key, secret.sign(digest, message)))
    }
}

/// RSASSA-PKCS1-v1_5 and RSASSA-PSS signer over an RSA private key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaSigner {
    alg: jwa::Algorithm,
}

impl RsaSigner {
    /// A signer for an RSA algorithm of either padding scheme
    ///
    /// # Errors
    ///
    /// The algorithm is not an RSA algorithm.
    pub fn new(alg: jwa::Algorithm) -> Result<Self, error::UnsupportedAlgorithm> {
        check_family(alg, jwa::Family::RsaPkcs1)
            .or_else(|_| check_family(alg, jwa::Family::RsaPss))?;
        Ok(Self { alg })
    }
}

impl Signer for RsaSigner {
    fn algorithm(&self) -> jwa::Algorithm {
        self.alg
    }

    fn sign(&self, message: &[u8], key: &Jwk) -> Result<Base64Url, error::SigningError> {
        let KeyParameters::RsaPrivate(private) = key.key_parameters() else {
            return Err(error::key_mismatch(self.alg, key.classify()).into());
        };
        key.ensure_usable(self.alg, KeyOperation::Sign)?;

        Ok(signed(self.alg, key, private.sign(self.alg, message)?))
    }
}

/// ECDSA signer over an EC private key on the algorithm's curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSigner {
    alg: jwa::Algorithm,
}

impl EcdsaSigner {
    /// A signer for an ECDSA algorithm
    ///
    /// # Errors
    ///
    /// The algorithm is not an ECDSA algorithm.
    pub fn new(alg: jwa::Algorithm) -> Result<Self, error::UnsupportedAlgorithm> {
        check_family(alg, jwa::Family::Ecdsa)?;
        Ok(Self { alg })
    }
}

impl Signer for EcdsaSigner {
    fn algorithm(&self) -> jwa::Algorithm {
        self.alg
    }

    fn sign(&self, message: &[u8], key: &Jwk) -> Result<Base64Url, error::SigningError> {
        let KeyParameters::EcPrivate(private) = key.key_parameters() else {
            return Err(error::key_mismatch(self.alg, key.classify()).into());
        };
        key.ensure_usable(self.alg, KeyOperation::Sign)?;

        Ok(signed(self.alg, key, private.sign(self.alg, message)?))
    }
}

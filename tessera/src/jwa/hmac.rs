//! HMAC JSON Web Algorithm implementations

use std::fmt;

use ring::rand::SecureRandom;
use tessera_base64::Base64Url;

use crate::{error, jwa};

/// A symmetric (`oct`) key
///
/// The key material is the `k` member exactly as written in the JWK. Its
/// UTF-8 bytes are what is fed to HMAC.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct Octet {
    k: String,
}

impl fmt::Debug for Octet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Octet { k }")
    }
}

impl Octet {
    /// A symmetric key using the provided `k` value
    pub fn new(k: impl Into<String>) -> Self {
        Self { k: k.into() }
    }

    /// Generates a new random secret sized for the algorithm's digest
    ///
    /// # Errors
    ///
    /// The algorithm is not an HMAC algorithm, or the system random number
    /// generator failed.
    pub fn generate(alg: jwa::Algorithm) -> Result<Self, error::Unexpected> {
        Self::generate_with_rng(alg, &ring::rand::SystemRandom::new())
    }

    /// Generates a new random secret using the provided source of randomness
    ///
    /// # Errors
    ///
    /// The algorithm is not an HMAC algorithm, or the provided RNG failed.
    pub fn generate_with_rng(
        alg: jwa::Algorithm,
        rng: &dyn SecureRandom,
    ) -> Result<Self, error::Unexpected> {
        let digest = match (alg.family(), alg.digest()) {
            (jwa::Family::Hmac, Some(digest)) => digest,
            _ => return Err(error::unexpected(format!("{alg} is not an HMAC algorithm"))),
        };

        let mut secret = vec![0; digest.output_len()];
        rng.fill(&mut secret)
            .map_err(|_| error::unexpected("random number generator failure"))?;

        Ok(Self {
            k: Base64Url::from_raw(secret).to_string(),
        })
    }

    /// The `k` member
    #[must_use]
    pub fn k(&self) -> &str {
        &self.k
    }

    /// Computes the MAC of `data`
    pub(crate) fn sign(&self, digest: jwa::Digest, data: &[u8]) -> Vec<u8> {
        let key = ring::hmac::Key::new(ring_algorithm(digest), self.k.as_bytes());
        ring::hmac::sign(&key, data).as_ref().to_owned()
    }

    /// Checks `tag` against the MAC of `data` in constant time
    pub(crate) fn verify(
        &self,
        digest: jwa::Digest,
        data: &[u8],
        tag: &[u8],
    ) -> Result<(), error::SignatureMismatch> {
        let key = ring::hmac::Key::new(ring_algorithm(digest), self.k.as_bytes());
        ring::hmac::verify(&key, data, tag).map_err(|_| error::signature_mismatch())
    }
}

fn ring_algorithm(digest: jwa::Digest) -> ring::hmac::Algorithm {
    match digest {
        jwa::Digest::Sha256 => ring::hmac::HMAC_SHA256,
        jwa::Digest::Sha384 => ring::hmac::HMAC_SHA384,
        jwa::Digest::Sha512 => ring::hmac::HMAC_SHA512,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_matches_digest_size() -> color_eyre::Result<()> {
        for (alg, len) in [
            (jwa::Algorithm::HS256, 32),
            (jwa::Algorithm::HS384, 48),
            (jwa::Algorithm::HS512, 64),
        ] {
            let key = Octet::generate(alg)?;
            assert_eq!(tessera_base64::decode(key.k())?.len(), len);
        }
        Ok(())
    }

    #[test]
    fn refuses_to_generate_for_other_families() {
        assert!(Octet::generate(jwa::Algorithm::RS256).is_err());
        assert!(Octet::generate(jwa::Algorithm::None).is_err());
    }

    #[test]
    fn mac_length_follows_digest() {
        let key = Octet::new("secret");
        assert_eq!(key.sign(jwa::Digest::Sha256, b"data").len(), 32);
        assert_eq!(key.sign(jwa::Digest::Sha384, b"data").len(), 48);
        assert_eq!(key.sign(jwa::Digest::Sha512, b"data").len(), 64);
    }

    #[test]
    fn verifies_only_the_exact_tag() {
        let key = Octet::new("secret");
        let tag = key.sign(jwa::Digest::Sha384, b"data");
        assert!(key.verify(jwa::Digest::Sha384, b"data", &tag).is_ok());
        assert!(key.verify(jwa::Digest::Sha384, b"date", &tag).is_err());
        assert!(key.verify(jwa::Digest::Sha384, b"data", &tag[..24]).is_err());
        assert!(key.verify(jwa::Digest::Sha256, b"data", &tag).is_err());
    }

    #[test]
    fn debug_does_not_reveal_secret() {
        let key = Octet::new("super-secret");
        assert!(!format!("{:?}", key).contains("super-secret"));
    }
}

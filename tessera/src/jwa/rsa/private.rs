use std::{fmt, sync::Arc};

use once_cell::sync::OnceCell;
use openssl::{bn::BigNumRef, rsa::Rsa};
use ring::{rand::SystemRandom, rsa::KeyPairComponents, signature::RsaKeyPair};
use serde::{Deserialize, Serialize};
use tessera_base64::{Base64Url, Base64UrlRef};

use super::PublicKey;
use crate::{error, jwa};

/// An additional prime of a multi-prime RSA key (`oth`)
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OtherPrime {
    /// Prime factor
    pub r: Base64Url,
    /// Factor CRT exponent
    pub d: Base64Url,
    /// Factor CRT coefficient
    pub t: Base64Url,
}

/// RSA private key parameters
///
/// Only the private exponent is required to represent a private key. Signing
/// additionally needs both prime factors and the three CRT parameters.
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    private_exponent: Base64Url,
    p: Option<Base64Url>,
    q: Option<Base64Url>,
    dp: Option<Base64Url>,
    dq: Option<Base64Url>,
    qi: Option<Base64Url>,
    other_primes: Vec<OtherPrime>,
    ring_cache: OnceCell<Arc<RsaKeyPair>>,
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
            && self.private_exponent == other.private_exponent
            && self.p == other.p
            && self.q == other.q
            && self.dp == other.dp
            && self.dq == other.dq
            && self.qi == other.qi
            && self.other_primes == other.other_primes
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Constructs a private key from the public key and private exponent (`d`)
    pub fn new(public_key: PublicKey, private_exponent: impl Into<Base64Url>) -> Self {
        Self {
            public_key,
            private_exponent: private_exponent.into(),
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            other_primes: Vec::new(),
            ring_cache: OnceCell::new(),
        }
    }

    /// Adds the prime factors (`p`, `q`)
    pub fn with_prime_factors(mut self, p: impl Into<Base64Url>, q: impl Into<Base64Url>) -> Self {
        self.p = Some(p.into());
        self.q = Some(q.into());
        self
    }

    /// Adds the Chinese Remainder Theorem parameters (`dp`, `dq`, `qi`)
    pub fn with_crt_parameters(
        mut self,
        dp: impl Into<Base64Url>,
        dq: impl Into<Base64Url>,
        qi: impl Into<Base64Url>,
    ) -> Self {
        self.dp = Some(dp.into());
        self.dq = Some(dq.into());
        self.qi = Some(qi.into());
        self
    }

    /// Adds the primes beyond the second (`oth`)
    pub fn with_other_primes(mut self, other_primes: Vec<OtherPrime>) -> Self {
        self.other_primes = other_primes;
        self
    }

    /// Sets whichever optional private members a JWK carried
    pub(crate) fn with_optional_members(
        mut self,
        [p, q, dp, dq, qi]: [Option<Base64Url>; 5],
    ) -> Self {
        self.p = p;
        self.q = q;
        self.dp = dp;
        self.dq = dq;
        self.qi = qi;
        self
    }

    /// Generates a new key pair with a modulus of `bits` bits and `e = 65537`
    ///
    /// # Errors
    ///
    /// Unable to generate a private key.
    pub fn generate(bits: u32) -> Result<Self, error::Unexpected> {
        let key = Rsa::generate(bits).map_err(error::unexpected)?;

        let member = |value: Option<&BigNumRef>| {
            value
                .map(|n| Base64Url::from_raw(n.to_vec()))
                .ok_or_else(|| error::unexpected("generated RSA key lacks CRT parameters"))
        };

        let public_key = PublicKey::new(key.n().to_vec(), key.e().to_vec());
        Ok(Self::new(public_key, key.d().to_vec())
            .with_prime_factors(member(key.p())?, member(key.q())?)
            .with_crt_parameters(
                member(key.dmp1())?,
                member(key.dmq1())?,
                member(key.iqmp())?,
            ))
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Extracts the public key
    pub fn into_public_key(self) -> PublicKey {
        self.public_key
    }

    /// The private exponent (`d`)
    #[must_use]
    pub fn private_exponent(&self) -> &Base64UrlRef {
        &self.private_exponent
    }

    /// The first prime factor (`p`)
    #[must_use]
    pub fn p(&self) -> Option<&Base64UrlRef> {
        self.p.as_deref()
    }

    /// The second prime factor (`q`)
    #[must_use]
    pub fn q(&self) -> Option<&Base64UrlRef> {
        self.q.as_deref()
    }

    /// The first factor CRT exponent (`dp`)
    #[must_use]
    pub fn dp(&self) -> Option<&Base64UrlRef> {
        self.dp.as_deref()
    }

    /// The second factor CRT exponent (`dq`)
    #[must_use]
    pub fn dq(&self) -> Option<&Base64UrlRef> {
        self.dq.as_deref()
    }

    /// The first CRT coefficient (`qi`)
    #[must_use]
    pub fn qi(&self) -> Option<&Base64UrlRef> {
        self.qi.as_deref()
    }

    /// Any primes beyond the second (`oth`)
    #[must_use]
    pub fn other_primes(&self) -> &[OtherPrime] {
        &self.other_primes
    }

    fn key_pair(&self) -> Result<&RsaKeyPair, error::KeyRejected> {
        let key_pair = self.ring_cache.get_or_try_init(|| {
            if !self.other_primes.is_empty() {
                return Err(error::key_rejected(
                    "multi-prime RSA keys cannot be used for signing",
                ));
            }

            let (Some(p), Some(q), Some(dp), Some(dq), Some(qi)) =
                (&self.p, &self.q, &self.dp, &self.dq, &self.qi)
            else {
                return Err(error::key_rejected(
                    "signing requires the prime factors and CRT parameters",
                ));
            };

            let components = KeyPairComponents {
                public_key: ring::rsa::PublicKeyComponents {
                    n: self.public_key.modulus().as_slice(),
                    e: self.public_key.exponent().as_slice(),
                },
                d: self.private_exponent.as_slice(),
                p: p.as_slice(),
                q: q.as_slice(),
                dP: dp.as_slice(),
                dQ: dq.as_slice(),
                qInv: qi.as_slice(),
            };

            RsaKeyPair::from_components(&components)
                .map(Arc::new)
                .map_err(|e| error::key_rejected(e.to_string()))
        })?;

        Ok(&**key_pair)
    }

    /// Signs `data` with the algorithm's padding and digest
    pub(crate) fn sign(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, error::SigningError> {
        let padding = super::padding(alg).ok_or_else(|| error::unsupported_algorithm(alg))?;

        let bits = self.public_key.modulus_bits();
        if bits < alg.min_key_size() {
            return Err(error::key_rejected(format!(
                "{alg} requires a modulus of at least {} bits, got {bits}",
                alg.min_key_size()
            ))
            .into());
        }

        let key_pair = self.key_pair()?;

        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(padding, &SystemRandom::new(), data, &mut signature)
            .map_err(|e| error::unexpected(e.to_string()))?;

        Ok(signature)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

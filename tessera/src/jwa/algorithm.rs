use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::{error, jwa};

/// A JWS signing algorithm
///
/// The set is closed. Every algorithm other than [`None`][Self::None] maps to
/// exactly one [`Family`] and one [`Digest`], and ECDSA algorithms to exactly
/// one curve.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
#[allow(clippy::upper_case_acronyms)]
pub enum Algorithm {
    /// No digital signature or MAC
    None,
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
    PS256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
    PS384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
    PS512,
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
    /// ECDSA using P-521 and SHA-512
    ES512,
}

/// The family of primitives an algorithm belongs to
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Family {
    /// Unsecured, no signature
    None,
    /// HMAC
    Hmac,
    /// RSASSA-PKCS1-v1_5
    RsaPkcs1,
    /// RSASSA-PSS
    RsaPss,
    /// ECDSA
    Ecdsa,
}

/// A SHA-2 digest
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Digest {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl Digest {
    /// Size in bytes of the digest output
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 256 / 8,
            Self::Sha384 => 384 / 8,
            Self::Sha512 => 512 / 8,
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        })
    }
}

struct Entry {
    name: &'static str,
    family: Family,
    digest: Option<Digest>,
    curve: Option<jwa::ec::Curve>,
    min_key_bits: usize,
}

impl Algorithm {
    /// Every supported algorithm, `none` included
    pub const ALL: [Algorithm; 13] = [
        Self::None,
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
    ];

    const fn entry(self) -> Entry {
        use jwa::ec::Curve::{P256, P384, P521};
        use Digest::{Sha256, Sha384, Sha512};
        use Family::{Ecdsa, Hmac, RsaPkcs1, RsaPss};

        const fn e(
            name: &'static str,
            family: Family,
            digest: Digest,
            curve: Option<jwa::ec::Curve>,
            min_key_bits: usize,
        ) -> Entry {
            Entry {
                name,
                family,
                digest: Some(digest),
                curve,
                min_key_bits,
            }
        }

        match self {
            Self::None => Entry {
                name: "none",
                family: Family::None,
                digest: None,
                curve: None,
                min_key_bits: 0,
            },
            Self::HS256 => e("HS256", Hmac, Sha256, None, 256),
            Self::HS384 => e("HS384", Hmac, Sha384, None, 384),
            Self::HS512 => e("HS512", Hmac, Sha512, None, 512),
            Self::RS256 => e("RS256", RsaPkcs1, Sha256, None, 2048),
            Self::RS384 => e("RS384", RsaPkcs1, Sha384, None, 2048),
            Self::RS512 => e("RS512", RsaPkcs1, Sha512, None, 2048),
            Self::PS256 => e("PS256", RsaPss, Sha256, None, 2048),
            Self::PS384 => e("PS384", RsaPss, Sha384, None, 2048),
            Self::PS512 => e("PS512", RsaPss, Sha512, None, 2048),
            Self::ES256 => e("ES256", Ecdsa, Sha256, Some(P256), 256),
            Self::ES384 => e("ES384", Ecdsa, Sha384, Some(P384), 384),
            Self::ES512 => e("ES512", Ecdsa, Sha512, Some(P521), 521),
        }
    }

    /// Resolves an `alg` header value
    ///
    /// An absent name resolves to [`None`][Self::None]. Any other name must
    /// match one of the supported algorithms exactly; there is no case folding
    /// and no fallback.
    ///
    /// # Errors
    ///
    /// The name is not a supported algorithm.
    pub fn resolve(name: Option<&str>) -> Result<Self, error::UnrecognizedAlgorithm> {
        match name {
            None => Ok(Self::None),
            Some(name) => Self::ALL
                .iter()
                .copied()
                .find(|alg| alg.name() == name)
                .ok_or_else(|| error::unrecognized_algorithm(name)),
        }
    }

    /// The registered `alg` name
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.entry().name
    }

    /// The family of primitives used by this algorithm
    #[must_use]
    pub const fn family(self) -> Family {
        self.entry().family
    }

    /// The digest used by this algorithm
    ///
    /// Returns `None` only for the `none` algorithm.
    #[must_use]
    pub const fn digest(self) -> Option<Digest> {
        self.entry().digest
    }

    /// The curve required by an ECDSA algorithm
    #[must_use]
    pub const fn curve(self) -> Option<jwa::ec::Curve> {
        self.entry().curve
    }

    /// The minimum key size in bits
    ///
    /// For HMAC this is the digest size, for RSA the modulus size, and for
    /// ECDSA the curve size.
    #[must_use]
    pub const fn min_key_size(self) -> usize {
        self.entry().min_key_bits
    }

    /// Gets the key usage related to this algorithm
    #[must_use]
    pub fn to_usage(self) -> Option<jwa::Usage> {
        match self.family() {
            Family::None => None,
            _ => Some(jwa::Usage::Signing),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnrecognizedAlgorithm;

    #[inline]
    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        Self::resolve(Some(value))
    }
}

impl TryFrom<String> for Algorithm {
    type Error = error::UnrecognizedAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = error::UnrecognizedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

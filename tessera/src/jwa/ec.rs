//! ECC JSON Web Algorithm implementations
//!
//! P-256 and P-384 are handled by *ring*. *ring* has no P-521 support, so
//! that curve goes through OpenSSL.

use std::{fmt, str::FromStr};

use openssl::{ec::EcGroup, nid::Nid};
use serde::{Deserialize, Serialize};

use crate::{error, jwa};

mod private;
mod public;

pub use private::PrivateKey;
pub use public::PublicKey;

/// A named ECC curve
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    /// The P-256 curve (prime256v1/secp256r1)
    #[serde(rename = "P-256")]
    P256,

    /// The P-384 curve (secp384r1)
    #[serde(rename = "P-384")]
    P384,

    /// The P-521 curve (secp521r1)
    #[serde(rename = "P-521")]
    P521,
}

impl Curve {
    /// The registered `crv` name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Size in bytes of a coordinate or private scalar on this curve
    #[must_use]
    pub const fn coordinate_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// Size in bytes of a JWS signature (`r || s`) on this curve
    #[must_use]
    pub const fn signature_size(self) -> usize {
        self.coordinate_size() * 2
    }

    /// The ECDSA algorithm that signs on this curve
    #[must_use]
    pub const fn algorithm(self) -> jwa::Algorithm {
        match self {
            Self::P256 => jwa::Algorithm::ES256,
            Self::P384 => jwa::Algorithm::ES384,
            Self::P521 => jwa::Algorithm::ES512,
        }
    }

    fn to_group(self) -> Result<EcGroup, openssl::error::ErrorStack> {
        let nid = match self {
            Self::P256 => Nid::X9_62_PRIME256V1,
            Self::P384 => Nid::SECP384R1,
            Self::P521 => Nid::SECP521R1,
        };

        EcGroup::from_curve_name(nid)
    }
}

impl FromStr for Curve {
    type Err = error::UnsupportedCurve;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::P256, Self::P384, Self::P521]
            .into_iter()
            .find(|curve| curve.name() == s)
            .ok_or_else(|| error::unsupported_curve(s))
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Left-pads a big-endian integer to the curve's coordinate size
fn fixed_width(curve: Curve, value: &[u8]) -> Option<Vec<u8>> {
    let size = curve.coordinate_size();
    let value: &[u8] = match value.iter().position(|&b| b != 0) {
        Some(start) => &value[start..],
        None => &[],
    };

    if value.len() > size {
        return None;
    }

    let mut out = vec![0; size - value.len()];
    out.extend_from_slice(value);
    Some(out)
}

/// The uncompressed SEC1 encoding of a public point
fn uncompressed_point(key: &PublicKey) -> Result<Vec<u8>, error::KeyRejected> {
    let curve = key.curve();
    let invalid = || error::key_rejected(format!("coordinate too large for {curve}"));

    let mut point = vec![0x04];
    point.extend(fixed_width(curve, key.x().as_slice()).ok_or_else(invalid)?);
    point.extend(fixed_width(curve, key.y().as_slice()).ok_or_else(invalid)?);
    Ok(point)
}

fn message_digest(digest: jwa::Digest) -> openssl::hash::MessageDigest {
    use openssl::hash::MessageDigest;

    match digest {
        jwa::Digest::Sha256 => MessageDigest::sha256(),
        jwa::Digest::Sha384 => MessageDigest::sha384(),
        jwa::Digest::Sha512 => MessageDigest::sha512(),
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::{jwk::KeyParameters, test, Jwk};

    fn private_key(json: &str) -> Result<PrivateKey> {
        let jwk: Jwk = json.parse()?;
        match jwk.key_parameters() {
            KeyParameters::EcPrivate(key) => Ok(key.clone()),
            other => Err(color_eyre::eyre::eyre!("unexpected key shape {:?}", other.variant())),
        }
    }

    #[test]
    fn curve_names_round_trip_through_serde() -> Result<()> {
        for curve in [Curve::P256, Curve::P384, Curve::P521] {
            let json = serde_json::to_string(&curve)?;
            assert_eq!(json, format!("\"{}\"", curve.name()));
            assert_eq!(serde_json::from_str::<Curve>(&json)?, curve);
            assert_eq!(curve.algorithm().curve(), Some(curve));
        }
        Ok(())
    }

    #[test]
    fn pads_short_coordinates() {
        assert_eq!(fixed_width(Curve::P256, &[1, 2]).map(|v| v.len()), Some(32));
        assert_eq!(fixed_width(Curve::P256, &[0; 40]).map(|v| v.len()), Some(32));
        assert_eq!(fixed_width(Curve::P256, &[1; 33]), None);
    }

    #[test]
    fn signs_and_verifies_on_each_curve() -> Result<()> {
        for (json, alg) in [
            (test::ec::JWK_P256_WITH_PRIVATE_KEY, jwa::Algorithm::ES256),
            (test::ec::JWK_P384_WITH_PRIVATE_KEY, jwa::Algorithm::ES384),
            (test::ec::JWK_P521_WITH_PRIVATE_KEY, jwa::Algorithm::ES512),
        ] {
            let key = private_key(json)?;
            let signature = key.sign(alg, b"signing input")?;
            assert_eq!(signature.len(), key.public_key().curve().signature_size());
            key.public_key().verify(alg, b"signing input", &signature)?;
            assert!(key
                .public_key()
                .verify(alg, b"signing inpuT", &signature)
                .is_err());
        }
        Ok(())
    }

    #[test]
    fn rejects_algorithm_for_other_curve() -> Result<()> {
        let key = private_key(test::ec::JWK_P256_WITH_PRIVATE_KEY)?;
        let err = key.sign(jwa::Algorithm::ES384, b"data").unwrap_err();
        assert!(err.is_curve_mismatch());
        Ok(())
    }

    #[test]
    fn generated_keys_sign_on_every_curve() -> Result<()> {
        for curve in [Curve::P256, Curve::P384, Curve::P521] {
            let key = PrivateKey::generate(curve)?;
            assert_eq!(key.d().as_slice().len(), curve.coordinate_size());
            let signature = key.sign(curve.algorithm(), b"data")?;
            key.public_key()
                .verify(curve.algorithm(), b"data", &signature)?;
        }
        Ok(())
    }
}

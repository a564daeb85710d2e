use openssl::{bn::BigNum, ec::EcKey, ecdsa::EcdsaSig};
use ring::signature::{self, UnparsedPublicKey};
use tessera_base64::{Base64Url, Base64UrlRef};

use super::{message_digest, uncompressed_point, Curve};
use crate::{error, jwa};

/// ECC public key parameters
#[derive(Debug, Clone, Eq, PartialEq)]
#[must_use]
pub struct PublicKey {
    curve: Curve,
    x: Base64Url,
    y: Base64Url,
}

impl PublicKey {
    /// Constructs a public key from its curve and affine coordinates
    pub fn new(curve: Curve, x: impl Into<Base64Url>, y: impl Into<Base64Url>) -> Self {
        Self {
            curve,
            x: x.into(),
            y: y.into(),
        }
    }

    /// The curve this key lies on
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The `x` coordinate
    #[must_use]
    pub fn x(&self) -> &Base64UrlRef {
        &self.x
    }

    /// The `y` coordinate
    #[must_use]
    pub fn y(&self) -> &Base64UrlRef {
        &self.y
    }

    pub(crate) fn to_openssl(
        &self,
    ) -> Result<EcKey<openssl::pkey::Public>, openssl::error::ErrorStack> {
        let group = self.curve.to_group()?;
        let x = BigNum::from_slice(self.x.as_slice())?;
        let y = BigNum::from_slice(self.y.as_slice())?;
        EcKey::from_public_key_affine_coordinates(&group, &x, &y)
    }

    /// Verifies an `r || s` signature over `data`
    ///
    /// The algorithm must be the ECDSA algorithm for this key's curve.
    pub(crate) fn verify(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::SignatureMismatch> {
        if alg.curve() != Some(self.curve) || signature.len() != self.curve.signature_size() {
            return Err(error::signature_mismatch());
        }

        let verification_algorithm = match self.curve {
            Curve::P256 => &signature::ECDSA_P256_SHA256_FIXED,
            Curve::P384 => &signature::ECDSA_P384_SHA384_FIXED,
            Curve::P521 => return self.verify_with_openssl(alg, data, signature),
        };

        let point = uncompressed_point(self).map_err(|_| error::signature_mismatch())?;
        UnparsedPublicKey::new(verification_algorithm, point)
            .verify(data, signature)
            .map_err(|_| error::signature_mismatch())
    }

    fn verify_with_openssl(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::SignatureMismatch> {
        let digest = alg.digest().ok_or_else(error::signature_mismatch)?;

        match self.openssl_verify(digest, data, signature) {
            Ok(true) => Ok(()),
            _ => Err(error::signature_mismatch()),
        }
    }

    fn openssl_verify(
        &self,
        digest: jwa::Digest,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, openssl::error::ErrorStack> {
        let key = self.to_openssl()?;
        let (r, s) = signature.split_at(self.curve.coordinate_size());
        let sig =
            EcdsaSig::from_private_components(BigNum::from_slice(r)?, BigNum::from_slice(s)?)?;
        let hash = openssl::hash::hash(message_digest(digest), data)?;
        sig.verify(&hash, &key)
    }
}

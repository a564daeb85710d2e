use std::{fmt, sync::Arc};

use once_cell::sync::OnceCell;
use openssl::{
    bn::{BigNum, BigNumContext},
    ec::EcKey,
    ecdsa::EcdsaSig,
    pkey::Private,
};
use ring::{
    rand::SystemRandom,
    signature::{self, EcdsaKeyPair},
};
use tessera_base64::{Base64Url, Base64UrlRef};

use super::{fixed_width, message_digest, uncompressed_point, Curve, PublicKey};
use crate::{error, jwa};

/// ECC private key parameters
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    d: Base64Url,
    ring_cache: OnceCell<Arc<EcdsaKeyPair>>,
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key && self.d == other.d
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Constructs a private key from the public key and private scalar (`d`)
    pub fn new(public_key: PublicKey, d: impl Into<Base64Url>) -> Self {
        Self {
            public_key,
            d: d.into(),
            ring_cache: OnceCell::new(),
        }
    }

    /// Generates a new ECC key pair on the specified curve
    ///
    /// Coordinates and the private scalar are written at the curve's full
    /// width.
    ///
    /// # Errors
    ///
    /// Unable to generate a private key.
    pub fn generate(curve: Curve) -> Result<Self, error::Unexpected> {
        let width = curve.coordinate_size() as i32;
        let group = curve.to_group().map_err(error::unexpected)?;
        let key = EcKey::generate(&group).map_err(error::unexpected)?;

        let mut ctx = BigNumContext::new().map_err(error::unexpected)?;
        let mut x = BigNum::new().map_err(error::unexpected)?;
        let mut y = BigNum::new().map_err(error::unexpected)?;
        key.public_key()
            .affine_coordinates_gfp(&group, &mut x, &mut y, &mut ctx)
            .map_err(error::unexpected)?;

        let public_key = PublicKey::new(
            curve,
            x.to_vec_padded(width).map_err(error::unexpected)?,
            y.to_vec_padded(width).map_err(error::unexpected)?,
        );
        let d = key
            .private_key()
            .to_vec_padded(width)
            .map_err(error::unexpected)?;

        Ok(Self::new(public_key, d))
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Extracts the public key
    pub fn into_public_key(self) -> PublicKey {
        self.public_key
    }

    /// The private scalar (`d`)
    #[must_use]
    pub fn d(&self) -> &Base64UrlRef {
        &self.d
    }

    fn ring_key_pair(
        &self,
        alg: &'static signature::EcdsaSigningAlgorithm,
    ) -> Result<&EcdsaKeyPair, error::KeyRejected> {
        let key_pair = self.ring_cache.get_or_try_init(|| {
            let curve = self.public_key.curve();
            let d = fixed_width(curve, self.d.as_slice()).ok_or_else(|| {
                error::key_rejected(format!("private scalar too large for {curve}"))
            })?;
            let point = uncompressed_point(&self.public_key)?;

            EcdsaKeyPair::from_private_key_and_public_key(alg, &d, &point, &SystemRandom::new())
                .map(Arc::new)
                .map_err(|e| error::key_rejected(e.to_string()))
        })?;

        Ok(&**key_pair)
    }

    fn to_openssl(&self) -> Result<EcKey<Private>, openssl::error::ErrorStack> {
        let public = self.public_key.to_openssl()?;
        let d = BigNum::from_slice(self.d.as_slice())?;
        let key = EcKey::from_private_components(public.group(), &d, public.public_key())?;
        key.check_key()?;
        Ok(key)
    }

    fn sign_with_openssl(
        &self,
        digest: jwa::Digest,
        data: &[u8],
    ) -> Result<Vec<u8>, openssl::error::ErrorStack> {
        let width = self.public_key.curve().coordinate_size() as i32;
        let key = self.to_openssl()?;
        let hash = openssl::hash::hash(message_digest(digest), data)?;
        let sig = EcdsaSig::sign(&hash, &key)?;

        let mut signature = sig.r().to_vec_padded(width)?;
        signature.extend(sig.s().to_vec_padded(width)?);
        Ok(signature)
    }

    /// Signs `data`, producing an `r || s` signature
    ///
    /// The algorithm must be the ECDSA algorithm for this key's curve.
    pub(crate) fn sign(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, error::SigningError> {
        let curve = self.public_key.curve();
        match alg.curve() {
            Some(c) if c == curve => {}
            Some(_) => return Err(error::curve_mismatch(alg, curve).into()),
            None => return Err(error::key_mismatch(alg, crate::jwk::KeyVariant::EcPrivate).into()),
        }

        let signing_algorithm = match curve {
            Curve::P256 => &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            Curve::P384 => &signature::ECDSA_P384_SHA384_FIXED_SIGNING,
            Curve::P521 => {
                let digest = alg
                    .digest()
                    .ok_or_else(|| error::unsupported_algorithm(alg))?;
                return self
                    .sign_with_openssl(digest, data)
                    .map_err(|e| error::key_rejected(e).into());
            }
        };

        let signature = self
            .ring_key_pair(signing_algorithm)?
            .sign(&SystemRandom::new(), data)
            .map_err(|e| error::unexpected(e.to_string()))?;

        Ok(signature.as_ref().to_owned())
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

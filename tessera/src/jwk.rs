//! Implementations of the JSON Web Keys (JWK) standard
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][].
//!
//! A [`Jwk`] always holds exactly one shape of key parameters. Which shape is
//! decided once, when the key is parsed or built, from the members present:
//!
//! | `kty` | members | variant |
//! |---|---|---|
//! | `EC` | `crv`, `x`, `y`, `d` | [`KeyVariant::EcPrivate`] |
//! | `EC` | `crv`, `x`, `y` | [`KeyVariant::EcPublic`] |
//! | `RSA` | `n`, `e`, `d` (+ `p`, `q`, `dp`, `dq`, `qi`, `oth`) | [`KeyVariant::RsaPrivate`] |
//! | `RSA` | `n`, `e` | [`KeyVariant::RsaPublic`] |
//! | `oct` | `k` | [`KeyVariant::Octet`] |
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use std::{convert::TryFrom, fmt, str::FromStr};

use aliri_braid::braid;
use serde::{Deserialize, Serialize, Serializer};
use tessera_base64::Base64Url;

use crate::{error, jwa};

mod builder;
mod generate;

pub use builder::{JwkBuilder, NoKeyParameters};

/// An identifier for a JWK
#[braid(serde, ref_doc = "A borrowed reference to a JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// The family of cryptographic key held by a JWK (`kty`)
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    /// Elliptic curve
    #[serde(rename = "EC")]
    Ec,

    /// RSA
    #[serde(rename = "RSA")]
    Rsa,

    /// Octet sequence, used for symmetric keys
    #[serde(rename = "oct")]
    Oct,
}

impl KeyType {
    /// The registered `kty` name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ec => "EC",
            Self::Rsa => "RSA",
            Self::Oct => "oct",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The shape of the key parameters held by a JWK
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum KeyVariant {
    /// RSA modulus and exponent
    RsaPublic,
    /// RSA public parameters plus the private exponent
    RsaPrivate,
    /// EC curve and point
    EcPublic,
    /// EC public parameters plus the private scalar
    EcPrivate,
    /// Symmetric secret
    Octet,
}

impl KeyVariant {
    /// The key type this variant belongs to
    #[must_use]
    pub const fn key_type(self) -> KeyType {
        match self {
            Self::RsaPublic | Self::RsaPrivate => KeyType::Rsa,
            Self::EcPublic | Self::EcPrivate => KeyType::Ec,
            Self::Octet => KeyType::Oct,
        }
    }
}

impl fmt::Display for KeyVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::RsaPublic => "RSA public",
            Self::RsaPrivate => "RSA private",
            Self::EcPublic => "EC public",
            Self::EcPrivate => "EC private",
            Self::Octet => "octet",
        })
    }
}

/// The cryptographic parameters of a JWK
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParameters {
    /// RSA public key
    RsaPublic(jwa::rsa::PublicKey),
    /// RSA private key
    RsaPrivate(jwa::rsa::PrivateKey),
    /// EC public key
    EcPublic(jwa::ec::PublicKey),
    /// EC private key
    EcPrivate(jwa::ec::PrivateKey),
    /// Symmetric key
    Octet(jwa::hmac::Octet),
}

impl KeyParameters {
    /// The shape of these parameters
    #[must_use]
    pub fn variant(&self) -> KeyVariant {
        match self {
            Self::RsaPublic(_) => KeyVariant::RsaPublic,
            Self::RsaPrivate(_) => KeyVariant::RsaPrivate,
            Self::EcPublic(_) => KeyVariant::EcPublic,
            Self::EcPrivate(_) => KeyVariant::EcPrivate,
            Self::Octet(_) => KeyVariant::Octet,
        }
    }

    /// The key type of these parameters
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.variant().key_type()
    }

    /// Whether these parameters can verify signatures made with `alg`
    ///
    /// EC keys are only compatible with the algorithm for their own curve, and
    /// RSA keys only when the modulus meets the algorithm's minimum size.
    #[must_use]
    pub fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        match (self, alg.family()) {
            (Self::RsaPublic(key), jwa::Family::RsaPkcs1 | jwa::Family::RsaPss) => {
                key.modulus_bits() >= alg.min_key_size()
            }
            (Self::RsaPrivate(key), jwa::Family::RsaPkcs1 | jwa::Family::RsaPss) => {
                key.public_key().modulus_bits() >= alg.min_key_size()
            }
            (Self::EcPublic(key), jwa::Family::Ecdsa) => alg.curve() == Some(key.curve()),
            (Self::EcPrivate(key), jwa::Family::Ecdsa) => {
                alg.curve() == Some(key.public_key().curve())
            }
            (Self::Octet(_), jwa::Family::Hmac) => true,
            _ => false,
        }
    }

    /// Strips any private key components
    ///
    /// Symmetric keys have no public form and are returned unchanged.
    #[must_use]
    pub fn public_only(self) -> Self {
        match self {
            Self::RsaPrivate(key) => Self::RsaPublic(key.into_public_key()),
            Self::EcPrivate(key) => Self::EcPublic(key.into_public_key()),
            other => other,
        }
    }
}

impl From<jwa::rsa::PublicKey> for KeyParameters {
    fn from(key: jwa::rsa::PublicKey) -> Self {
        Self::RsaPublic(key)
    }
}

impl From<jwa::rsa::PrivateKey> for KeyParameters {
    fn from(key: jwa::rsa::PrivateKey) -> Self {
        Self::RsaPrivate(key)
    }
}

impl From<jwa::ec::PublicKey> for KeyParameters {
    fn from(key: jwa::ec::PublicKey) -> Self {
        Self::EcPublic(key)
    }
}

impl From<jwa::ec::PrivateKey> for KeyParameters {
    fn from(key: jwa::ec::PrivateKey) -> Self {
        Self::EcPrivate(key)
    }
}

impl From<jwa::hmac::Octet> for KeyParameters {
    fn from(key: jwa::hmac::Octet) -> Self {
        Self::Octet(key)
    }
}

/// An identified JSON Web Key
///
/// Parse one from JSON with [`str::parse`], or construct one with
/// [`Jwk::builder`] or [`Jwk::generate`].
///
/// ```
/// use tessera::{jwk::KeyVariant, Jwk};
///
/// let jwk: Jwk = r#"{"kty":"oct","kid":"shared","k":"c2VjcmV0"}"#.parse()?;
/// assert_eq!(jwk.classify(), KeyVariant::Octet);
/// assert_eq!(jwk.to_json(), r#"{"kty":"oct","kid":"shared","k":"c2VjcmV0"}"#);
/// # Ok::<(), tessera::error::JwkError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "JwkDto")]
#[must_use]
pub struct Jwk {
    usage: Option<jwa::Usage>,
    key_operations: Option<Vec<jwa::KeyOperation>>,
    algorithm: Option<jwa::Algorithm>,
    key_id: Option<KeyId>,
    x509_url: Option<String>,
    x509_chain: Option<Vec<String>>,
    x509_thumbprint: Option<String>,
    x509_thumbprint_sha256: Option<String>,
    key: KeyParameters,
}

impl Jwk {
    /// The key type (`kty`)
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.key.key_type()
    }

    /// The intended usage of the key (`use`)
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The operations the key may be used for (`key_ops`)
    #[must_use]
    pub fn key_operations(&self) -> Option<&[jwa::KeyOperation]> {
        self.key_operations.as_deref()
    }

    /// The algorithm to be used with this JWK (`alg`)
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// The key ID (`kid`)
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The X.509 URL (`x5u`)
    #[must_use]
    pub fn x509_url(&self) -> Option<&str> {
        self.x509_url.as_deref()
    }

    /// The X.509 certificate chain (`x5c`)
    #[must_use]
    pub fn x509_chain(&self) -> Option<&[String]> {
        self.x509_chain.as_deref()
    }

    /// The X.509 certificate SHA-1 thumbprint (`x5t`)
    #[must_use]
    pub fn x509_thumbprint(&self) -> Option<&str> {
        self.x509_thumbprint.as_deref()
    }

    /// The X.509 certificate SHA-256 thumbprint (`x5t#S256`)
    #[must_use]
    pub fn x509_thumbprint_sha256(&self) -> Option<&str> {
        self.x509_thumbprint_sha256.as_deref()
    }

    /// The cryptographic parameters of the key
    #[must_use]
    pub fn key_parameters(&self) -> &KeyParameters {
        &self.key
    }

    /// The shape of the key parameters this JWK holds
    #[must_use]
    pub fn classify(&self) -> KeyVariant {
        self.key.variant()
    }

    /// Whether the key may be used with the given algorithm
    ///
    /// The key parameters must fit the algorithm's family and, if the key
    /// names an algorithm, it must be this one.
    #[must_use]
    pub fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        self.key.is_compatible(alg) && self.algorithm.map_or(true, |a| a == alg)
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            key_id: Some(kid.into()),
            ..self
        }
    }

    /// Strips any private key components
    pub fn public_only(self) -> Self {
        Self {
            key: self.key.public_only(),
            ..self
        }
    }

    /// Serializes the key as a flat JSON object
    ///
    /// Absent members are omitted.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("JWK serialization is infallible")
    }

    /// Checks the `use`, `key_ops`, and `alg` restrictions of the key
    pub(crate) fn ensure_usable(
        &self,
        alg: jwa::Algorithm,
        op: jwa::KeyOperation,
    ) -> Result<(), error::SigningError> {
        if self.usage == Some(jwa::Usage::Encryption) {
            return Err(error::jwk_usage_mismatch().into());
        }

        if let Some(ops) = &self.key_operations {
            if !ops.contains(&op) {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        match self.algorithm {
            Some(key_alg) if key_alg != alg => Err(error::incompatible_algorithm(alg).into()),
            _ => Ok(()),
        }
    }

    pub(crate) fn from_value(value: serde_json::Value) -> Result<Self, error::JwkError> {
        let dto: JwkDto = serde_json::from_value(value).map_err(error::invalid_jwk_json)?;
        Self::try_from(dto)
    }
}

impl From<KeyParameters> for Jwk {
    fn from(key: KeyParameters) -> Self {
        Self {
            usage: None,
            key_operations: None,
            algorithm: None,
            key_id: None,
            x509_url: None,
            x509_chain: None,
            x509_thumbprint: None,
            x509_thumbprint_sha256: None,
            key,
        }
    }
}

impl FromStr for Jwk {
    type Err = error::JwkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dto: JwkDto = serde_json::from_str(s).map_err(error::invalid_jwk_json)?;
        Self::try_from(dto)
    }
}

impl Serialize for Jwk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        JwkDto::from(self).serialize(serializer)
    }
}

#[derive(Default, Serialize, Deserialize)]
struct JwkDto {
    kty: String,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    usage: Option<jwa::Usage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    key_ops: Option<Vec<jwa::KeyOperation>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    alg: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<KeyId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    x5u: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    x5c: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    x5t: Option<String>,

    #[serde(rename = "x5t#S256", skip_serializing_if = "Option::is_none")]
    x5t_s256: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    crv: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    e: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    dp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    dq: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    qi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    oth: Option<Vec<jwa::rsa::OtherPrime>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    k: Option<String>,
}

fn decode(
    param: &'static str,
    value: &Option<String>,
) -> Result<Option<Base64Url>, error::InvalidKeyParameter> {
    value
        .as_deref()
        .map(|v| Base64Url::from_encoded(v).map_err(|e| error::invalid_key_parameter(param, e)))
        .transpose()
}

impl JwkDto {
    fn key_parameters(&self) -> Result<KeyParameters, error::JwkError> {
        match self.kty.as_str() {
            "EC" => {
                let (Some(crv), Some(x), Some(y)) =
                    (&self.crv, decode("x", &self.x)?, decode("y", &self.y)?)
                else {
                    return Err(error::missing_key_parameters(KeyType::Ec).into());
                };
                let crv: jwa::ec::Curve = crv.parse()?;

                let public_key = jwa::ec::PublicKey::new(crv, x, y);
                let key = match decode("d", &self.d)? {
                    Some(d) => KeyParameters::EcPrivate(jwa::ec::PrivateKey::new(public_key, d)),
                    None => KeyParameters::EcPublic(public_key),
                };

                Ok(key)
            }
            "RSA" => {
                let (Some(n), Some(e)) = (decode("n", &self.n)?, decode("e", &self.e)?) else {
                    return Err(error::missing_key_parameters(KeyType::Rsa).into());
                };

                let public_key = jwa::rsa::PublicKey::new(n, e);
                let Some(d) = decode("d", &self.d)? else {
                    return Ok(KeyParameters::RsaPublic(public_key));
                };

                let key = jwa::rsa::PrivateKey::new(public_key, d)
                    .with_optional_members([
                        decode("p", &self.p)?,
                        decode("q", &self.q)?,
                        decode("dp", &self.dp)?,
                        decode("dq", &self.dq)?,
                        decode("qi", &self.qi)?,
                    ])
                    .with_other_primes(self.oth.clone().unwrap_or_default());

                Ok(KeyParameters::RsaPrivate(key))
            }
            "oct" => match &self.k {
                Some(k) => Ok(KeyParameters::Octet(jwa::hmac::Octet::new(k.as_str()))),
                None => Err(error::missing_key_parameters(KeyType::Oct).into()),
            },
            other => Err(error::unsupported_key_type(other).into()),
        }
    }

    fn set_rsa_public(&mut self, key: &jwa::rsa::PublicKey) {
        self.n = Some(key.modulus().to_string());
        self.e = Some(key.exponent().to_string());
    }

    fn set_ec_public(&mut self, key: &jwa::ec::PublicKey) {
        self.crv = Some(key.curve().name().to_owned());
        self.x = Some(key.x().to_string());
        self.y = Some(key.y().to_string());
    }
}

impl TryFrom<JwkDto> for Jwk {
    type Error = error::JwkError;

    fn try_from(dto: JwkDto) -> Result<Self, Self::Error> {
        let key = dto.key_parameters()?;
        let algorithm = dto
            .alg
            .as_deref()
            .map(jwa::Algorithm::try_from)
            .transpose()?;

        Ok(Self {
            usage: dto.usage,
            key_operations: dto.key_ops,
            algorithm,
            key_id: dto.kid,
            x509_url: dto.x5u,
            x509_chain: dto.x5c,
            x509_thumbprint: dto.x5t,
            x509_thumbprint_sha256: dto.x5t_s256,
            key,
        })
    }
}

impl From<&'_ Jwk> for JwkDto {
    fn from(jwk: &Jwk) -> Self {
        let mut dto = Self {
            kty: jwk.key_type().name().to_owned(),
            usage: jwk.usage,
            key_ops: jwk.key_operations.clone(),
            alg: jwk.algorithm.map(|alg| alg.name().to_owned()),
            kid: jwk.key_id.clone(),
            x5u: jwk.x509_url.clone(),
            x5c: jwk.x509_chain.clone(),
            x5t: jwk.x509_thumbprint.clone(),
            x5t_s256: jwk.x509_thumbprint_sha256.clone(),
            ..Self::default()
        };

        match &jwk.key {
            KeyParameters::RsaPublic(key) => dto.set_rsa_public(key),
            KeyParameters::RsaPrivate(key) => {
                dto.set_rsa_public(key.public_key());
                dto.d = Some(key.private_exponent().to_string());
                dto.p = key.p().map(ToString::to_string);
                dto.q = key.q().map(ToString::to_string);
                dto.dp = key.dp().map(ToString::to_string);
                dto.dq = key.dq().map(ToString::to_string);
                dto.qi = key.qi().map(ToString::to_string);
                if !key.other_primes().is_empty() {
                    dto.oth = Some(key.other_primes().to_vec());
                }
            }
            KeyParameters::EcPublic(key) => dto.set_ec_public(key),
            KeyParameters::EcPrivate(key) => {
                dto.set_ec_public(key.public_key());
                dto.d = Some(key.d().to_string());
            }
            KeyParameters::Octet(key) => dto.k = Some(key.k().to_owned()),
        }

        dto
    }
}

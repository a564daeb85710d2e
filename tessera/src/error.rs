//! Common errors

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

use crate::{jwa, jwk};

pub use tessera_base64::DecodeError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The provided name could not be matched with supported algorithms
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{alg}' does not match supported algorithms")]
pub struct UnrecognizedAlgorithm {
    alg: String,
}

impl UnrecognizedAlgorithm {
    /// The algorithm name that failed to resolve
    #[must_use]
    pub fn name(&self) -> &str {
        &self.alg
    }
}

#[inline]
pub(crate) fn unrecognized_algorithm(alg: impl Into<String>) -> UnrecognizedAlgorithm {
    UnrecognizedAlgorithm { alg: alg.into() }
}

/// The algorithm cannot be used to sign or verify
///
/// Raised for `none` and for names that do not resolve to any supported
/// algorithm at all.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("algorithm '{alg}' is not supported for signatures")]
pub struct UnsupportedAlgorithm {
    alg: String,
}

impl UnsupportedAlgorithm {
    /// The name of the rejected algorithm
    #[must_use]
    pub fn name(&self) -> &str {
        &self.alg
    }
}

#[inline]
pub(crate) fn unsupported_algorithm(alg: impl ToString) -> UnsupportedAlgorithm {
    UnsupportedAlgorithm {
        alg: alg.to_string(),
    }
}

impl From<UnrecognizedAlgorithm> for UnsupportedAlgorithm {
    fn from(err: UnrecognizedAlgorithm) -> Self {
        Self { alg: err.alg }
    }
}

/// The JWK is restricted to a different algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key incompatible with algorithm '{alg}'")]
pub struct IncompatibleAlgorithm {
    alg: jwa::Algorithm,
}

#[inline]
pub(crate) fn incompatible_algorithm(alg: jwa::Algorithm) -> IncompatibleAlgorithm {
    IncompatibleAlgorithm { alg }
}

/// The key's parameter shape does not belong to the algorithm's family
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("{variant} key cannot be used with algorithm '{alg}'")]
pub struct KeyMismatch {
    alg: jwa::Algorithm,
    variant: jwk::KeyVariant,
}

impl KeyMismatch {
    /// The key variant that was offered
    #[must_use]
    pub fn variant(&self) -> jwk::KeyVariant {
        self.variant
    }
}

#[inline]
pub(crate) fn key_mismatch(alg: jwa::Algorithm, variant: jwk::KeyVariant) -> KeyMismatch {
    KeyMismatch { alg, variant }
}

/// The EC key lies on a different curve than the algorithm requires
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("algorithm '{alg}' cannot be used with a {curve} key")]
pub struct CurveMismatch {
    alg: jwa::Algorithm,
    curve: jwa::ec::Curve,
}

#[inline]
pub(crate) fn curve_mismatch(alg: jwa::Algorithm, curve: jwa::ec::Curve) -> CurveMismatch {
    CurveMismatch { alg, curve }
}

/// The JWK has a specific usage that disallows this use
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("JWK cannot be used in this way")]
pub struct JwkUsageMismatch {
    _p: (),
}

pub(crate) const fn jwk_usage_mismatch() -> JwkUsageMismatch {
    JwkUsageMismatch { _p: () }
}

/// The JWK fields do not describe any key of its type
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("JWK fields do not describe any {kty} key")]
pub struct MissingKeyParameters {
    kty: jwk::KeyType,
}

#[inline]
pub(crate) fn missing_key_parameters(kty: jwk::KeyType) -> MissingKeyParameters {
    MissingKeyParameters { kty }
}

/// The `kty` member names a key type that is not supported
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported key type '{kty}'")]
pub struct UnsupportedKeyType {
    kty: String,
}

#[inline]
pub(crate) fn unsupported_key_type(kty: impl Into<String>) -> UnsupportedKeyType {
    UnsupportedKeyType { kty: kty.into() }
}

/// The `crv` of an EC key is not a supported curve
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported curve '{crv}'")]
pub struct UnsupportedCurve {
    crv: String,
}

impl UnsupportedCurve {
    /// The curve name as written
    #[must_use]
    pub fn name(&self) -> &str {
        &self.crv
    }
}

pub(crate) fn unsupported_curve(crv: impl Into<String>) -> UnsupportedCurve {
    UnsupportedCurve { crv: crv.into() }
}

/// The declared key type disagrees with the key parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key declared as {declared} but parameters describe a {actual} key")]
pub struct KeyTypeMismatch {
    declared: jwk::KeyType,
    actual: jwk::KeyType,
}

#[inline]
pub(crate) fn key_type_mismatch(declared: jwk::KeyType, actual: jwk::KeyType) -> KeyTypeMismatch {
    KeyTypeMismatch { declared, actual }
}

/// A JWK parameter holds something other than base64url data
#[derive(Debug, Error)]
#[error("JWK parameter '{param}' is not valid base64url")]
pub struct InvalidKeyParameter {
    param: &'static str,
    #[source]
    source: DecodeError,
}

#[inline]
pub(crate) fn invalid_key_parameter(
    param: &'static str,
    source: DecodeError,
) -> InvalidKeyParameter {
    InvalidKeyParameter { param, source }
}

/// The JWK document is not a JSON object of the expected shape
#[derive(Debug, Error)]
#[error("malformed JWK")]
pub struct InvalidJwkJson {
    #[from]
    source: BoxError,
}

pub(crate) fn invalid_jwk_json(source: impl Into<BoxError>) -> InvalidJwkJson {
    InvalidJwkJson {
        source: source.into(),
    }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The key was rejected by the cryptographic backend
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: BoxError,
}

pub(crate) fn key_rejected(source: impl Into<BoxError>) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// The JWS is malformed and cannot be split into header, payload, and signature segments
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("malformed JWS: expected 3 segments, found {segments}")]
pub struct MalformedJws {
    segments: usize,
}

pub(crate) fn malformed_jws(segments: usize) -> MalformedJws {
    MalformedJws { segments }
}

/// The JWS header segment is malformed
#[derive(Debug, Error)]
#[error("malformed JWS header")]
pub struct MalformedJwsHeader {
    #[from]
    source: BoxError,
}

pub(crate) fn malformed_jws_header(source: impl Into<BoxError>) -> MalformedJwsHeader {
    MalformedJwsHeader {
        source: source.into(),
    }
}

/// The JWS payload segment is malformed
#[derive(Debug, Error)]
#[error("malformed JWS payload")]
pub struct MalformedJwsPayload {
    #[from]
    source: BoxError,
}

pub(crate) fn malformed_jws_payload(source: impl Into<BoxError>) -> MalformedJwsPayload {
    MalformedJwsPayload {
        source: source.into(),
    }
}

/// The JWS signature segment is malformed
#[derive(Debug, Error)]
#[error("malformed JWS signature")]
pub struct MalformedJwsSignature {
    #[from]
    source: BoxError,
}

pub(crate) fn malformed_jws_signature(source: impl Into<BoxError>) -> MalformedJwsSignature {
    MalformedJwsSignature {
        source: source.into(),
    }
}

/// The JWS builder was never given a header set
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("cannot build a JWS without headers")]
pub struct MissingHeaders {
    _p: (),
}

pub(crate) const fn missing_headers() -> MissingHeaders {
    MissingHeaders { _p: () }
}

/// The JWS builder was never given a protected header set
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("cannot build a JWS without protected headers")]
pub struct MissingProtectedHeaders {
    _p: (),
}

pub(crate) const fn missing_protected_headers() -> MissingProtectedHeaders {
    MissingProtectedHeaders { _p: () }
}

/// The JWS builder was never given a payload
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("cannot build a JWS without a payload")]
pub struct MissingPayload {
    _p: (),
}

pub(crate) const fn missing_payload() -> MissingPayload {
    MissingPayload { _p: () }
}

/// The JWS builder was never given a key to sign with
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("cannot build a JWS without a signing key")]
pub struct MissingSigningKey {
    _p: (),
}

pub(crate) const fn missing_signing_key() -> MissingSigningKey {
    MissingSigningKey { _p: () }
}

/// The header algorithm is not covered by the protected header
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("the protected header must carry the same 'alg' as the header")]
pub struct UnprotectedAlgorithm {
    _p: (),
}

pub(crate) const fn unprotected_algorithm() -> UnprotectedAlgorithm {
    UnprotectedAlgorithm { _p: () }
}

/// The key source holds no matching key
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no key with id '{kid}' available from '{url}'")]
pub struct KeyNotFound {
    url: String,
    kid: String,
}

pub(crate) fn key_not_found(url: impl Into<String>, kid: impl Into<String>) -> KeyNotFound {
    KeyNotFound {
        url: url.into(),
        kid: kid.into(),
    }
}

/// The JWS header lacks the member needed to look up its key
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("JWS header does not carry '{member}'")]
pub struct MissingKeyReference {
    member: &'static str,
}

pub(crate) const fn missing_key_reference(member: &'static str) -> MissingKeyReference {
    MissingKeyReference { member }
}

/// Unexpected error (possibly a bug)
#[derive(Debug, Error)]
#[error("unexpected error")]
pub struct Unexpected {
    #[from]
    source: BoxError,
}

pub(crate) fn unexpected(source: impl Into<BoxError>) -> Unexpected {
    Unexpected {
        source: source.into(),
    }
}

/// An error occurring while parsing or classifying a JWK
#[derive(Debug, Error)]
pub enum JwkError {
    /// The document is not a JWK-shaped JSON object
    #[error(transparent)]
    InvalidJson(#[from] InvalidJwkJson),

    /// The `kty` is not one of `EC`, `RSA`, or `oct`
    #[error(transparent)]
    UnsupportedKeyType(#[from] UnsupportedKeyType),

    /// The fields present do not satisfy any key variant
    #[error(transparent)]
    MissingKeyParameters(#[from] MissingKeyParameters),

    /// The `crv` of an EC key is not a supported curve
    #[error(transparent)]
    UnsupportedCurve(#[from] UnsupportedCurve),

    /// A key parameter could not be decoded
    #[error(transparent)]
    InvalidKeyParameter(#[from] InvalidKeyParameter),

    /// The `alg` member is not a supported algorithm
    #[error(transparent)]
    UnrecognizedAlgorithm(#[from] UnrecognizedAlgorithm),
}

impl JwkError {
    /// Whether the error is due to an unsupported key type
    #[must_use]
    pub fn is_unsupported_key_type(&self) -> bool {
        matches!(self, Self::UnsupportedKeyType(_))
    }

    /// Whether the error is due to missing key parameters
    #[must_use]
    pub fn is_missing_key_parameters(&self) -> bool {
        matches!(self, Self::MissingKeyParameters(_))
    }
}

/// An error occurring while creating a signature
#[derive(Debug, Error)]
pub enum SigningError {
    /// The algorithm cannot produce signatures
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// The key variant does not belong to the algorithm family
    #[error(transparent)]
    KeyMismatch(#[from] KeyMismatch),

    /// The EC key is on a different curve than the algorithm
    #[error(transparent)]
    CurveMismatch(#[from] CurveMismatch),

    /// The JWK is restricted to a different algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// JWK cannot be used for signature creation
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// The key material was rejected
    #[error(transparent)]
    KeyRejected(#[from] KeyRejected),

    /// An unexpected error
    #[error(transparent)]
    Unexpected(#[from] Unexpected),
}

impl SigningError {
    /// Whether the error is due to a key of the wrong variant
    #[must_use]
    pub fn is_key_mismatch(&self) -> bool {
        matches!(self, Self::KeyMismatch(_))
    }

    /// Whether the error is due to a key on the wrong curve
    #[must_use]
    pub fn is_curve_mismatch(&self) -> bool {
        matches!(self, Self::CurveMismatch(_))
    }

    /// Whether the error is due to an algorithm that cannot sign
    #[must_use]
    pub fn is_unsupported_algorithm(&self) -> bool {
        matches!(self, Self::UnsupportedAlgorithm(_))
    }
}

/// An error occurring while generating a new JWK
#[derive(Debug, Error)]
pub enum KeyGenerationError {
    /// The algorithm has no associated key type
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// The key material could not be generated
    #[error(transparent)]
    Unexpected(#[from] Unexpected),
}

/// An error occurring while parsing a compact JWS
#[derive(Debug, Error)]
pub enum JwsParseError {
    /// The token does not have exactly three segments
    #[error(transparent)]
    MalformedToken(#[from] MalformedJws),

    /// The header segment is not base64url-encoded JSON
    #[error(transparent)]
    InvalidHeader(#[from] MalformedJwsHeader),

    /// The payload segment is not base64url-encoded UTF-8
    #[error(transparent)]
    InvalidPayload(#[from] MalformedJwsPayload),

    /// The signature segment is not base64url
    #[error(transparent)]
    InvalidSignature(#[from] MalformedJwsSignature),
}

impl JwsParseError {
    /// Whether the error is due to the wrong number of segments
    #[must_use]
    pub fn is_malformed_token(&self) -> bool {
        matches!(self, Self::MalformedToken(_))
    }

    /// Whether the error is due to a malformed header
    #[must_use]
    pub fn is_invalid_header(&self) -> bool {
        matches!(self, Self::InvalidHeader(_))
    }

    /// Whether the error was caused by a segment that is not valid base64url
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        let source = match self {
            Self::MalformedToken(_) => return false,
            Self::InvalidHeader(e) => e.source(),
            Self::InvalidPayload(e) => e.source(),
            Self::InvalidSignature(e) => e.source(),
        };

        source.map_or(false, |s| s.is::<DecodeError>())
    }
}

/// An error occurring while building a JWS
#[derive(Debug, Error)]
pub enum JwsBuildError {
    /// No header set was provided
    #[error(transparent)]
    MissingHeaders(#[from] MissingHeaders),

    /// No protected header set was provided
    #[error(transparent)]
    MissingProtectedHeaders(#[from] MissingProtectedHeaders),

    /// No payload was provided
    #[error(transparent)]
    MissingPayload(#[from] MissingPayload),

    /// No signing key was attached
    #[error(transparent)]
    MissingSigningKey(#[from] MissingSigningKey),

    /// The header `alg` is not a known algorithm
    #[error(transparent)]
    UnrecognizedAlgorithm(#[from] UnrecognizedAlgorithm),

    /// The header `alg` is `none` or absent
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// The protected header does not protect the header `alg`
    #[error(transparent)]
    UnprotectedAlgorithm(#[from] UnprotectedAlgorithm),

    /// The payload could not be serialized
    #[error(transparent)]
    MalformedPayload(#[from] MalformedJwsPayload),

    /// The signer rejected the key or failed
    #[error(transparent)]
    SigningError(#[from] SigningError),
}

impl JwsBuildError {
    /// Whether the error is due to a missing signing key
    #[must_use]
    pub fn is_missing_signing_key(&self) -> bool {
        matches!(self, Self::MissingSigningKey(_))
    }

    /// Whether the error is due to an algorithm that could not be used
    #[must_use]
    pub fn is_algorithm_error(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedAlgorithm(_) | Self::UnsupportedAlgorithm(_)
        )
    }
}

/// An error occurring while validating a JWS against a key from a key source
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The header `alg` cannot be used to verify
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// The header does not say where to find the key
    #[error(transparent)]
    MissingKeyReference(#[from] MissingKeyReference),

    /// The key source failed to produce a key
    #[error("unable to obtain verification key")]
    KeySource(#[source] BoxError),
}

impl ValidationError {
    /// Whether the error originated in the key source
    #[must_use]
    pub fn is_key_source_error(&self) -> bool {
        matches!(self, Self::KeySource(_))
    }
}

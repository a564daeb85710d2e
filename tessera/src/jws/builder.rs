use serde::Serialize;

use super::{create_signer, Headers, Jws};
use crate::{error, jwa, Jwk};

/// Accumulates the parts of a JWS before signing it
///
/// The header set names the algorithm; the protected header set must carry
/// the same `alg`, and only the protected header set is signed and
/// serialized.
///
/// ```
/// use tessera::{jwa, jws::Headers, Jwk, Jws};
///
/// let key = Jwk::generate(jwa::Algorithm::HS256)?;
/// let headers = Headers::new().with_alg(jwa::Algorithm::HS256);
///
/// let jws = Jws::builder()
///     .with_headers(headers.clone())
///     .with_protected_headers(headers)
///     .with_payload("hello")
///     .with_jwk(&key)
///     .build()?;
///
/// assert!(jws.serialize().starts_with("eyJhbGciOiJIUzI1NiJ9.aGVsbG8."));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct JwsBuilder<'a> {
    headers: Option<Headers>,
    protected: Option<Headers>,
    payload: Option<Result<String, error::MalformedJwsPayload>>,
    key: Option<&'a Jwk>,
}

impl<'a> JwsBuilder<'a> {
    /// Sets the full header set
    pub fn with_headers(self, headers: Headers) -> Self {
        Self {
            headers: Some(headers),
            ..self
        }
    }

    /// Sets the header members covered by the signature
    pub fn with_protected_headers(self, protected: Headers) -> Self {
        Self {
            protected: Some(protected),
            ..self
        }
    }

    /// Sets the payload as raw text
    pub fn with_payload(self, payload: impl Into<String>) -> Self {
        Self {
            payload: Some(Ok(payload.into())),
            ..self
        }
    }

    /// Sets the payload as the JSON serialization of `payload`
    ///
    /// A serialization failure is reported by [`build()`][Self::build()].
    pub fn with_json_payload<P: Serialize + ?Sized>(self, payload: &P) -> Self {
        let payload = serde_json::to_string(payload).map_err(error::malformed_jws_payload);
        Self {
            payload: Some(payload),
            ..self
        }
    }

    /// Attaches the key used to sign
    pub fn with_jwk(self, key: &'a Jwk) -> Self {
        Self {
            key: Some(key),
            ..self
        }
    }

    /// Signs the accumulated parts
    ///
    /// # Errors
    ///
    /// * A header set, the payload, or the key was never provided
    /// * The header `alg` is unknown, absent, or `none`
    /// * The protected headers do not carry the same `alg`
    /// * The key cannot produce signatures for the algorithm
    pub fn build(self) -> Result<Jws, error::JwsBuildError> {
        let headers = self.headers.ok_or_else(error::missing_headers)?;
        let protected = self.protected.ok_or_else(error::missing_protected_headers)?;
        let payload = self.payload.ok_or_else(error::missing_payload)??;
        let key = self.key.ok_or_else(error::missing_signing_key)?;

        let alg = jwa::Algorithm::resolve(headers.alg())?;
        let signer = create_signer(alg)?;

        if protected.alg() != Some(alg.name()) {
            return Err(error::unprotected_algorithm().into());
        }

        let mut jws = Jws::unsigned(protected.to_json(), protected.to_fields(), payload);
        jws.signature = signer.sign(jws.signing_input().as_bytes(), key)?;
        jws.headers = Some(headers);

        Ok(jws)
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::test;

    fn rfc_headers() -> Headers {
        Headers::new()
            .with_typ("JWT")
            .with_alg(jwa::Algorithm::HS512)
    }

    #[test]
    fn reproduces_known_hmac_token() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        let jws = Jws::builder()
            .with_headers(rfc_headers())
            .with_protected_headers(rfc_headers())
            .with_payload(test::RFC_PAYLOAD)
            .with_jwk(&key)
            .build()?;

        assert_eq!(jws.serialize(), test::HS512_TOKEN);
        assert_eq!(jws.headers(), Some(&rfc_headers()));
        Ok(())
    }

    #[test]
    fn signs_only_the_protected_headers() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        let jws = Jws::builder()
            .with_headers(rfc_headers().with_kid("unprotected"))
            .with_protected_headers(rfc_headers())
            .with_payload(test::RFC_PAYLOAD)
            .with_jwk(&key)
            .build()?;

        assert_eq!(jws.serialize(), test::HS512_TOKEN);
        assert_eq!(jws.header().kid(), None);
        Ok(())
    }

    #[test]
    fn requires_every_part() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;

        let err = Jws::builder()
            .with_protected_headers(rfc_headers())
            .with_payload("p")
            .with_jwk(&key)
            .build()
            .unwrap_err();
        assert!(matches!(err, error::JwsBuildError::MissingHeaders(_)));

        let err = Jws::builder()
            .with_headers(rfc_headers())
            .with_payload("p")
            .with_jwk(&key)
            .build()
            .unwrap_err();
        assert!(matches!(err, error::JwsBuildError::MissingProtectedHeaders(_)));

        let err = Jws::builder()
            .with_headers(rfc_headers())
            .with_protected_headers(rfc_headers())
            .with_jwk(&key)
            .build()
            .unwrap_err();
        assert!(matches!(err, error::JwsBuildError::MissingPayload(_)));
        assert!(!err.is_missing_signing_key());

        let err = Jws::builder()
            .with_headers(rfc_headers())
            .with_protected_headers(rfc_headers())
            .with_payload("p")
            .build()
            .unwrap_err();
        assert!(err.is_missing_signing_key());
        assert!(matches!(err, error::JwsBuildError::MissingSigningKey(_)));
        Ok(())
    }

    #[test]
    fn rejects_unknown_or_absent_algorithms() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        let build = |headers: Headers| {
            Jws::builder()
                .with_headers(headers.clone())
                .with_protected_headers(headers)
                .with_payload("p")
                .with_jwk(&key)
                .build()
        };

        let err = build(Headers::new().with("alg", "blah")).unwrap_err();
        assert!(matches!(err, error::JwsBuildError::UnrecognizedAlgorithm(_)));

        let err = build(Headers::new().with_alg(jwa::Algorithm::None)).unwrap_err();
        assert!(matches!(err, error::JwsBuildError::UnsupportedAlgorithm(_)));

        let err = build(Headers::new().with_typ("JWT")).unwrap_err();
        assert!(err.is_algorithm_error());
        Ok(())
    }

    #[test]
    fn protected_headers_must_carry_the_algorithm() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        for protected in [
            Headers::new().with_typ("JWT"),
            Headers::new().with_alg(jwa::Algorithm::HS256),
        ] {
            let err = Jws::builder()
                .with_headers(rfc_headers())
                .with_protected_headers(protected)
                .with_payload("p")
                .with_jwk(&key)
                .build()
                .unwrap_err();
            assert!(matches!(err, error::JwsBuildError::UnprotectedAlgorithm(_)));
        }
        Ok(())
    }

    #[test]
    fn mistyped_protected_members_still_round_trip() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        let headers = rfc_headers().with("kid", 7);
        let jws = Jws::builder()
            .with_headers(headers.clone())
            .with_protected_headers(headers)
            .with_payload("p")
            .with_jwk(&key)
            .build()?;

        assert_eq!(jws.header().kid(), None);
        let parsed = Jws::parse(&jws.serialize())?;
        assert_eq!(parsed, Jws { headers: None, ..jws });
        Ok(())
    }

    #[test]
    fn surfaces_signer_errors() -> Result<()> {
        let key: Jwk = test::rsa::JWK.parse()?;
        let headers = Headers::new().with_alg(jwa::Algorithm::RS256);
        let err = Jws::builder()
            .with_headers(headers.clone())
            .with_protected_headers(headers)
            .with_payload("p")
            .with_jwk(&key)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            error::JwsBuildError::SigningError(error::SigningError::KeyMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn serializes_json_payloads() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        let headers = Headers::new().with_alg(jwa::Algorithm::HS512);
        let jws = Jws::builder()
            .with_headers(headers.clone())
            .with_protected_headers(headers)
            .with_json_payload(&serde_json::json!({ "sub": "tessera" }))
            .with_jwk(&key)
            .build()?;

        assert_eq!(jws.payload(), r#"{"sub":"tessera"}"#);
        Ok(())
    }

    #[test]
    fn reports_unserializable_payloads() -> Result<()> {
        use std::collections::HashMap;

        let key: Jwk = test::hmac::JWK.parse()?;
        let headers = Headers::new().with_alg(jwa::Algorithm::HS512);
        let payload: HashMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let err = Jws::builder()
            .with_headers(headers.clone())
            .with_protected_headers(headers)
            .with_json_payload(&payload)
            .with_jwk(&key)
            .build()
            .unwrap_err();
        assert!(matches!(err, error::JwsBuildError::MalformedPayload(_)));
        Ok(())
    }
}

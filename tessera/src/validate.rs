//! Signature validation
//!
//! A signature that does not verify is reported as `false`. So is a key that
//! cannot verify the token's algorithm, whatever the reason; the reason is
//! only logged. Errors are reserved for tokens whose `alg` cannot be used
//! at all.

use std::error::Error as StdError;

use crate::{
    error,
    jwa::{self, KeyOperation},
    jwk::KeyParameters,
    source::KeySource,
    Jwk, Jws,
};

/// Validates JWS signatures
///
/// ```
/// use tessera::{jwa, validate::Validator, Jwk, Jws};
///
/// let key: Jwk = r#"{"kty":"oct","k":"c2VjcmV0"}"#.parse()?;
/// let jws = Jws::parse("eyJhbGciOiJIUzI1NiJ9.aGk.AAAA")?;
///
/// assert!(!Validator::default().validate(&jws, &key)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct Validator {
    approved_algorithms: Vec<jwa::Algorithm>,
}

impl Validator {
    /// Approves a single algorithm
    ///
    /// Once any algorithm is approved, tokens using any other algorithm do
    /// not validate.
    #[inline]
    pub fn add_approved_algorithm(self, alg: jwa::Algorithm) -> Self {
        let mut this = self;
        this.approved_algorithms.push(alg);
        this
    }

    /// Approves multiple algorithms
    #[inline]
    pub fn extend_approved_algorithms<I: IntoIterator<Item = jwa::Algorithm>>(
        self,
        alg: I,
    ) -> Self {
        let mut this = self;
        this.approved_algorithms.extend(alg);
        this
    }

    fn is_approved(&self, alg: jwa::Algorithm) -> bool {
        self.approved_algorithms.is_empty() || self.approved_algorithms.contains(&alg)
    }

    /// Checks the signature of `jws` against `jwk`
    ///
    /// # Errors
    ///
    /// The protected header `alg` is absent, `none`, or not a supported
    /// algorithm.
    pub fn validate(&self, jws: &Jws, jwk: &Jwk) -> Result<bool, error::UnsupportedAlgorithm> {
        let alg = jws.algorithm()?;
        let Some(digest) = alg.digest() else {
            return Err(error::unsupported_algorithm(alg));
        };

        if !self.is_approved(alg) {
            tracing::debug!(%alg, "algorithm not approved");
            return Ok(false);
        }

        if !jwk.is_compatible(alg) {
            tracing::debug!(
                %alg,
                key = %jwk.classify(),
                kid = ?jwk.key_id(),
                "key cannot verify algorithm"
            );
            return Ok(false);
        }

        if let Err(reason) = jwk.ensure_usable(alg, KeyOperation::Verify) {
            tracing::debug!(%alg, kid = ?jwk.key_id(), %reason, "key may not be used to verify");
            return Ok(false);
        }

        let message = jws.signing_input();
        let message = message.as_bytes();
        let signature = jws.signature().as_slice();

        let verified = match jwk.key_parameters() {
            KeyParameters::Octet(secret) => secret.verify(digest, message, signature).is_ok(),
            KeyParameters::RsaPublic(key) => key.verify(alg, message, signature).is_ok(),
            KeyParameters::RsaPrivate(key) => {
                key.public_key().verify(alg, message, signature).is_ok()
            }
            KeyParameters::EcPublic(key) => key.verify(alg, message, signature).is_ok(),
            KeyParameters::EcPrivate(key) => {
                key.public_key().verify(alg, message, signature).is_ok()
            }
        };

        if verified {
            tracing::trace!(%alg, kid = ?jwk.key_id(), "signature verified");
        } else {
            tracing::debug!(%alg, kid = ?jwk.key_id(), "signature mismatch");
        }

        Ok(verified)
    }

    /// Checks the signature of `jws` against the key its header points to
    ///
    /// The key is fetched from `source` using the protected header's `jku`
    /// and `kid`.
    ///
    /// # Errors
    ///
    /// * The protected header lacks `jku` or `kid`
    /// * The key source fails to produce the key
    /// * The protected header `alg` cannot be used, as for [`validate()`][Self::validate()]
    pub async fn validate_with_source<'a, S>(
        &self,
        jws: &'a Jws,
        source: &'a S,
    ) -> Result<bool, error::ValidationError>
    where
        S: KeySource<'a>,
        S::Error: StdError + Send + Sync + 'static,
    {
        let header = jws.header();
        let jku = header.jku().ok_or(error::missing_key_reference("jku"))?;
        let kid = header.kid().ok_or_else(|| {
            tracing::debug!(%jku, "token names no key");
            error::missing_key_reference("kid")
        })?;

        let jwk = source
            .fetch(jku, kid)
            .await
            .map_err(|e| error::ValidationError::KeySource(Box::new(e)))?;

        Ok(self.validate(jws, &jwk)?)
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        jws::Headers,
        source::LocalKeySource,
        test, Jwks,
    };

    fn sign(alg: jwa::Algorithm, jwk: &Jwk, payload: &str) -> Result<Jws> {
        let headers = Headers::new().with_alg(alg);
        Ok(Jws::builder()
            .with_headers(headers.clone())
            .with_protected_headers(headers)
            .with_payload(payload)
            .with_jwk(jwk)
            .build()?)
    }

    fn tamper(jws: &Jws) -> Result<Jws> {
        let token = jws.serialize();
        let payload = tessera_base64::encode(format!("{}!", jws.payload()));
        let mut segments: Vec<&str> = token.split('.').collect();
        segments[1] = &payload;
        Ok(Jws::parse(&segments.join("."))?)
    }

    mod known_tokens {
        use super::*;

        #[test]
        #[traced_test]
        fn hmac() -> Result<()> {
            let key: Jwk = test::hmac::JWK.parse()?;
            let jws = Jws::parse(test::HS512_TOKEN)?;
            assert!(Validator::default().validate(&jws, &key)?);
            assert!(logs_contain("signature verified"));
            Ok(())
        }

        #[test]
        fn rsa() -> Result<()> {
            let jws = Jws::parse(test::RS256_TOKEN)?;
            for json in [test::rsa::JWK, test::rsa::JWK_WITH_PRIVATE_KEY] {
                let key: Jwk = json.parse()?;
                assert!(Validator::default().validate(&jws, &key)?);
            }
            Ok(())
        }

        #[test]
        fn ecdsa() -> Result<()> {
            let jws = Jws::parse(test::ES256_TOKEN)?;
            for json in [test::ec::JWK_P256, test::ec::JWK_P256_WITH_PRIVATE_KEY] {
                let key: Jwk = json.parse()?;
                assert!(Validator::default().validate(&jws, &key)?);
            }
            Ok(())
        }
    }

    #[test]
    fn generated_keys_round_trip_for_every_algorithm() -> Result<()> {
        let validator = Validator::default();
        for alg in jwa::Algorithm::ALL {
            if alg == jwa::Algorithm::None {
                continue;
            }

            let key = Jwk::generate(alg)?;
            let jws = sign(alg, &key, test::RFC_PAYLOAD)?;
            assert!(validator.validate(&jws, &key)?, "{alg}");
            assert!(validator.validate(&jws, &key.clone().public_only())?, "{alg}");
            assert!(!validator.validate(&tamper(&jws)?, &key)?, "{alg}");
        }
        Ok(())
    }

    #[test]
    fn reparsed_tokens_still_validate() -> Result<()> {
        let key = Jwk::generate(jwa::Algorithm::ES384)?;
        let jws = sign(jwa::Algorithm::ES384, &key, "payload")?;
        let reparsed = Jws::parse(&jws.serialize())?;
        assert!(Validator::default().validate(&reparsed, &key)?);
        Ok(())
    }

    #[test]
    #[traced_test]
    fn wrong_symmetric_key_is_false() -> Result<()> {
        let jws = Jws::parse(test::HS512_TOKEN)?;
        let other: Jwk = r#"{"kty":"oct","k":"c29tZSBvdGhlciBzZWNyZXQ"}"#.parse()?;
        assert!(!Validator::default().validate(&jws, &other)?);
        assert!(logs_contain("signature mismatch"));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn key_of_another_family_is_false() -> Result<()> {
        let jws = Jws::parse(test::HS512_TOKEN)?;
        let rsa: Jwk = test::rsa::JWK.parse()?;
        assert!(!Validator::default().validate(&jws, &rsa)?);
        assert!(logs_contain("key cannot verify algorithm"));
        Ok(())
    }

    #[test]
    fn key_on_another_curve_is_false() -> Result<()> {
        let jws = Jws::parse(test::ES256_TOKEN)?;
        let p384: Jwk = test::ec::JWK_P384_WITH_PRIVATE_KEY.parse()?;
        assert!(!Validator::default().validate(&jws, &p384)?);
        Ok(())
    }

    #[test]
    fn truncated_signature_is_false() -> Result<()> {
        let parsed = Jws::parse(test::HS512_TOKEN)?;
        let truncated = Jws::from_parts(
            parsed.protected_header(),
            parsed.payload(),
            &parsed.signature().as_slice()[..32],
        )?;
        let key: Jwk = test::hmac::JWK.parse()?;
        assert!(!Validator::default().validate(&truncated, &key)?);
        Ok(())
    }

    #[test]
    #[traced_test]
    fn encryption_keys_do_not_verify() -> Result<()> {
        let jws = Jws::parse(test::HS512_TOKEN)?;
        let key: Jwk = test::hmac::JWK
            .replace(r#""kty": "oct","#, r#""kty": "oct", "use": "enc","#)
            .parse()?;
        assert_eq!(key.usage(), Some(jwa::Usage::Encryption));
        assert!(!Validator::default().validate(&jws, &key)?);
        assert!(logs_contain("key may not be used to verify"));
        Ok(())
    }

    #[test]
    fn unknown_or_absent_algorithms_are_errors() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        for header in [
            r#"{"alg":"blah"}"#,
            r#"{"alg":"none"}"#,
            r#"{"typ":"JWT"}"#,
            r#"{"alg":5}"#,
        ] {
            let jws = Jws::from_parts(header, "hi", tessera_base64::Base64Url::new())?;
            assert!(Validator::default().validate(&jws, &key).is_err(), "{header}");
        }
        Ok(())
    }

    #[test]
    #[traced_test]
    fn unapproved_algorithms_are_false() -> Result<()> {
        let key: Jwk = test::hmac::JWK.parse()?;
        let jws = Jws::parse(test::HS512_TOKEN)?;

        let strict = Validator::default().add_approved_algorithm(jwa::Algorithm::HS256);
        assert!(!strict.validate(&jws, &key)?);
        assert!(logs_contain("algorithm not approved"));

        let approving = strict.extend_approved_algorithms([jwa::Algorithm::HS512]);
        assert!(approving.validate(&jws, &key)?);
        Ok(())
    }

    mod with_source {
        use super::*;

        const URL: &str = "https://issuer.example.com/jwks.json";

        fn source(key: &Jwk) -> LocalKeySource {
            let jwks: Jwks = [key.clone().public_only()].into_iter().collect();
            LocalKeySource::default().with_set(URL, jwks)
        }

        fn signed_with_reference(key: &Jwk, headers: Headers) -> Result<Jws> {
            Ok(Jws::builder()
                .with_headers(headers.clone())
                .with_protected_headers(headers)
                .with_payload("payload")
                .with_jwk(key)
                .build()?)
        }

        #[tokio::test]
        async fn fetches_the_referenced_key() -> Result<()> {
            let key = Jwk::generate_with_key_id(jwa::Algorithm::ES256, "ec-1")?;
            let headers = Headers::new()
                .with_alg(jwa::Algorithm::ES256)
                .with_kid("ec-1")
                .with_jku(URL);
            let jws = signed_with_reference(&key, headers)?;

            assert!(Validator::default().validate_with_source(&jws, &source(&key)).await?);
            Ok(())
        }

        #[tokio::test]
        async fn requires_a_key_reference() -> Result<()> {
            let key = Jwk::generate_with_key_id(jwa::Algorithm::HS256, "h-1")?;
            let source = source(&key);

            let no_kid = signed_with_reference(
                &key,
                Headers::new().with_alg(jwa::Algorithm::HS256).with_jku(URL),
            )?;
            let err = Validator::default()
                .validate_with_source(&no_kid, &source)
                .await
                .unwrap_err();
            assert!(matches!(err, error::ValidationError::MissingKeyReference(_)));

            let no_jku = signed_with_reference(
                &key,
                Headers::new().with_alg(jwa::Algorithm::HS256).with_kid("h-1"),
            )?;
            let err = Validator::default()
                .validate_with_source(&no_jku, &source)
                .await
                .unwrap_err();
            assert!(matches!(err, error::ValidationError::MissingKeyReference(_)));
            Ok(())
        }

        #[tokio::test]
        async fn surfaces_key_source_failures() -> Result<()> {
            let key = Jwk::generate_with_key_id(jwa::Algorithm::HS256, "h-1")?;
            let headers = Headers::new()
                .with_alg(jwa::Algorithm::HS256)
                .with_kid("unknown")
                .with_jku(URL);
            let signer = key.clone().with_key_id("unknown");
            let jws = signed_with_reference(&signer, headers)?;

            let err = Validator::default()
                .validate_with_source(&jws, &source(&key))
                .await
                .unwrap_err();
            assert!(err.is_key_source_error());
            Ok(())
        }
    }
}

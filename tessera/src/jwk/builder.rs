use crate::{error, jwa};

use super::{Jwk, KeyId, KeyParameters, KeyType};

/// Builder state before any key parameters have been provided
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeyParameters;

#[derive(Debug, Clone, Default)]
struct Metadata {
    key_type: Option<KeyType>,
    usage: Option<jwa::Usage>,
    key_operations: Option<Vec<jwa::KeyOperation>>,
    algorithm: Option<jwa::Algorithm>,
    key_id: Option<KeyId>,
    x509_url: Option<String>,
    x509_chain: Option<Vec<String>>,
    x509_thumbprint: Option<String>,
    x509_thumbprint_sha256: Option<String>,
}

/// A staged builder for a [`Jwk`]
///
/// Metadata may be set in any order. Exactly one set of key parameters must
/// be provided before the key can be built; the key parameter setters only
/// exist on a builder that does not yet hold any.
///
/// ```
/// use tessera::{jwa, jwk::KeyVariant, Jwk};
///
/// let jwk = Jwk::builder()
///     .with_key_id("shared")
///     .with_algorithm(jwa::Algorithm::HS256)
///     .with_octet_params(jwa::hmac::Octet::new("c2VjcmV0"))
///     .with_usage(jwa::Usage::Signing)
///     .build()?;
///
/// assert_eq!(jwk.classify(), KeyVariant::Octet);
/// # Ok::<(), tessera::error::KeyTypeMismatch>(())
/// ```
///
/// A second set of key parameters is rejected at compile time:
///
/// ```compile_fail
/// use tessera::{jwa, Jwk};
///
/// let jwk = Jwk::builder()
///     .with_octet_params(jwa::hmac::Octet::new("c2VjcmV0"))
///     .with_octet_params(jwa::hmac::Octet::new("b3RoZXI"))
///     .build();
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct JwkBuilder<K> {
    metadata: Metadata,
    key: K,
}

impl Jwk {
    /// Starts building a new JWK
    pub fn builder() -> JwkBuilder<NoKeyParameters> {
        JwkBuilder::default()
    }
}

impl Default for JwkBuilder<NoKeyParameters> {
    fn default() -> Self {
        Self {
            metadata: Metadata::default(),
            key: NoKeyParameters,
        }
    }
}

impl<K> JwkBuilder<K> {
    /// Declares the key type (`kty`)
    ///
    /// The declaration is checked against the key parameters when building.
    pub fn with_key_type(mut self, kty: KeyType) -> Self {
        self.metadata.key_type = Some(kty);
        self
    }

    /// Sets the intended usage (`use`)
    pub fn with_usage(mut self, usage: jwa::Usage) -> Self {
        self.metadata.usage = Some(usage);
        self
    }

    /// Sets the permitted operations (`key_ops`)
    pub fn with_key_operations(
        mut self,
        ops: impl IntoIterator<Item = jwa::KeyOperation>,
    ) -> Self {
        self.metadata.key_operations = Some(ops.into_iter().collect());
        self
    }

    /// Restricts the key to a single algorithm (`alg`)
    pub fn with_algorithm(mut self, alg: jwa::Algorithm) -> Self {
        self.metadata.algorithm = Some(alg);
        self
    }

    /// Sets the key ID (`kid`)
    pub fn with_key_id(mut self, kid: impl Into<KeyId>) -> Self {
        self.metadata.key_id = Some(kid.into());
        self
    }

    /// Sets the X.509 URL (`x5u`)
    pub fn with_x509_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.x509_url = Some(url.into());
        self
    }

    /// Sets the X.509 certificate chain (`x5c`)
    pub fn with_x509_chain(mut self, chain: impl IntoIterator<Item = String>) -> Self {
        self.metadata.x509_chain = Some(chain.into_iter().collect());
        self
    }

    /// Sets the X.509 SHA-1 thumbprint (`x5t`)
    pub fn with_x509_thumbprint(mut self, thumbprint: impl Into<String>) -> Self {
        self.metadata.x509_thumbprint = Some(thumbprint.into());
        self
    }

    /// Sets the X.509 SHA-256 thumbprint (`x5t#S256`)
    pub fn with_x509_thumbprint_sha256(mut self, thumbprint: impl Into<String>) -> Self {
        self.metadata.x509_thumbprint_sha256 = Some(thumbprint.into());
        self
    }
}

impl JwkBuilder<NoKeyParameters> {
    fn with_key(self, key: impl Into<KeyParameters>) -> JwkBuilder<KeyParameters> {
        JwkBuilder {
            metadata: self.metadata,
            key: key.into(),
        }
    }

    /// Provides RSA private key parameters
    pub fn with_rsa_private_params(self, key: jwa::rsa::PrivateKey) -> JwkBuilder<KeyParameters> {
        self.with_key(key)
    }

    /// Provides RSA public key parameters
    pub fn with_rsa_public_params(self, key: jwa::rsa::PublicKey) -> JwkBuilder<KeyParameters> {
        self.with_key(key)
    }

    /// Provides EC private key parameters
    pub fn with_ec_private_params(self, key: jwa::ec::PrivateKey) -> JwkBuilder<KeyParameters> {
        self.with_key(key)
    }

    /// Provides EC public key parameters
    pub fn with_ec_public_params(self, key: jwa::ec::PublicKey) -> JwkBuilder<KeyParameters> {
        self.with_key(key)
    }

    /// Provides a symmetric secret
    pub fn with_octet_params(self, key: jwa::hmac::Octet) -> JwkBuilder<KeyParameters> {
        self.with_key(key)
    }
}

impl JwkBuilder<KeyParameters> {
    /// Builds the JWK
    ///
    /// # Errors
    ///
    /// A key type was declared that does not match the key parameters.
    pub fn build(self) -> Result<Jwk, error::KeyTypeMismatch> {
        let Self { metadata, key } = self;

        if let Some(declared) = metadata.key_type {
            if declared != key.key_type() {
                return Err(error::key_type_mismatch(declared, key.key_type()));
            }
        }

        Ok(Jwk {
            usage: metadata.usage,
            key_operations: metadata.key_operations,
            algorithm: metadata.algorithm,
            key_id: metadata.key_id,
            x509_url: metadata.x509_url,
            x509_chain: metadata.x509_chain,
            x509_thumbprint: metadata.x509_thumbprint,
            x509_thumbprint_sha256: metadata.x509_thumbprint_sha256,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::{jwk::KeyVariant, test};

    #[test]
    fn builds_each_variant() -> Result<()> {
        let rsa: Jwk = test::rsa::JWK_WITH_PRIVATE_KEY.parse()?;
        let ec: Jwk = test::ec::JWK_P256_WITH_PRIVATE_KEY.parse()?;

        let (KeyParameters::RsaPrivate(rsa_key), KeyParameters::EcPrivate(ec_key)) =
            (rsa.key_parameters().clone(), ec.key_parameters().clone())
        else {
            color_eyre::eyre::bail!("fixtures hold private keys");
        };

        let built = [
            Jwk::builder().with_rsa_private_params(rsa_key.clone()),
            Jwk::builder().with_rsa_public_params(rsa_key.into_public_key()),
            Jwk::builder().with_ec_private_params(ec_key.clone()),
            Jwk::builder().with_ec_public_params(ec_key.into_public_key()),
            Jwk::builder().with_octet_params(jwa::hmac::Octet::new("secret")),
        ]
        .into_iter()
        .map(|b| b.build().map(|jwk| jwk.classify()))
        .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(
            built,
            [
                KeyVariant::RsaPrivate,
                KeyVariant::RsaPublic,
                KeyVariant::EcPrivate,
                KeyVariant::EcPublic,
                KeyVariant::Octet,
            ]
        );
        Ok(())
    }

    #[test]
    fn metadata_can_follow_key_parameters() -> Result<()> {
        let jwk = Jwk::builder()
            .with_usage(jwa::Usage::Signing)
            .with_octet_params(jwa::hmac::Octet::new("secret"))
            .with_key_id("late")
            .with_key_operations([jwa::KeyOperation::Sign])
            .with_x509_url("https://example.com/cert")
            .build()?;

        assert_eq!(jwk.key_id().map(|k| k.as_str()), Some("late"));
        assert_eq!(jwk.usage(), Some(jwa::Usage::Signing));
        assert_eq!(jwk.key_operations(), Some(&[jwa::KeyOperation::Sign][..]));
        assert_eq!(jwk.x509_url(), Some("https://example.com/cert"));
        Ok(())
    }

    #[test]
    fn built_key_matches_parsed_key() -> Result<()> {
        let parsed: Jwk = test::hmac::JWK.parse()?;
        let KeyParameters::Octet(key) = parsed.key_parameters().clone() else {
            color_eyre::eyre::bail!("fixture holds an octet key");
        };

        let built = Jwk::builder()
            .with_key_id(test::hmac::TEST_KEY_ID)
            .with_octet_params(key)
            .build()?;

        assert_eq!(built.to_json(), parsed.to_json());
        Ok(())
    }

    #[test]
    fn declared_key_type_must_match() -> Result<()> {
        let err = Jwk::builder()
            .with_key_type(KeyType::Rsa)
            .with_octet_params(jwa::hmac::Octet::new("secret"))
            .build()
            .unwrap_err();
        assert_eq!(err, error::key_type_mismatch(KeyType::Rsa, KeyType::Oct));

        let jwk = Jwk::builder()
            .with_key_type(KeyType::Oct)
            .with_octet_params(jwa::hmac::Octet::new("secret"))
            .build()?;
        assert_eq!(jwk.key_type(), KeyType::Oct);
        Ok(())
    }
}

//! Sources of verification keys
//!
//! Key retrieval is a capability handed to whatever needs it, usually
//! [`Validator::validate_with_source()`][crate::validate::Validator::validate_with_source()].
//! This crate performs no network I/O; fetching remote key sets is left to
//! implementations of [`KeySource`].

use std::{collections::HashMap, future::Future};

use crate::{error, jwk, Jwk, Jwks};

/// Resolves a key by the URL of its key set and its key ID
pub trait KeySource<'a> {
    /// The error returned when no key can be produced
    type Error;

    /// The future resolving to the key
    type Future: Future<Output = Result<Jwk, Self::Error>> + 'a;

    /// Fetches the key identified by `kid` from the key set at `url`
    fn fetch(&'a self, url: &'a str, kid: &'a jwk::KeyIdRef) -> Self::Future;
}

/// An in-memory key source keyed by key set URL
///
/// ```
/// use tessera::{jwk::KeyIdRef, source::{KeySource, LocalKeySource}, Jwks};
///
/// let jwks: Jwks = serde_json::from_str(r#"{"keys":[{"kty":"oct","kid":"a","k":"AAAA"}]}"#)?;
/// let source = LocalKeySource::default().with_set("https://example.com/jwks.json", jwks);
///
/// let fetched = source.fetch("https://example.com/jwks.json", KeyIdRef::from_str("a"));
/// # let _ = fetched;
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct LocalKeySource {
    sets: HashMap<String, Jwks>,
}

impl LocalKeySource {
    /// Registers the key set served at `url`
    ///
    /// A set already registered at the same URL is replaced.
    #[must_use]
    pub fn with_set(mut self, url: impl Into<String>, jwks: Jwks) -> Self {
        self.sets.insert(url.into(), jwks);
        self
    }

    /// Looks up a key without going through a future
    ///
    /// # Errors
    ///
    /// No set is registered at `url`, or the set holds no key with that ID.
    pub fn get(&self, url: &str, kid: &jwk::KeyIdRef) -> Result<&Jwk, error::KeyNotFound> {
        let key = self.sets.get(url).and_then(|set| set.find(kid));

        if key.is_none() {
            tracing::debug!(%url, %kid, "key not found in local key source");
        }

        key.ok_or_else(|| error::key_not_found(url, kid.as_str()))
    }
}

impl<'a> KeySource<'a> for LocalKeySource {
    type Error = error::KeyNotFound;
    type Future = std::future::Ready<Result<Jwk, Self::Error>>;

    fn fetch(&'a self, url: &'a str, kid: &'a jwk::KeyIdRef) -> Self::Future {
        std::future::ready(self.get(url, kid).map(Clone::clone))
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::test;

    const URL: &str = "https://issuer.example.com/.well-known/jwks.json";

    fn source() -> Result<LocalKeySource> {
        let jwks: Jwks = serde_json::from_str(test::mixed::JWKS)?;
        Ok(LocalKeySource::default().with_set(URL, jwks))
    }

    #[tokio::test]
    async fn fetches_registered_keys() -> Result<()> {
        let source = source()?;
        let kid = jwk::KeyIdRef::from_str(test::rsa::TEST_KEY_ID);
        let jwk = source.fetch(URL, kid).await?;
        assert_eq!(jwk.key_id(), Some(kid));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_kid_is_not_found() -> Result<()> {
        let source = source()?;
        let err = source
            .fetch(URL, jwk::KeyIdRef::from_str("missing"))
            .await
            .unwrap_err();
        assert_eq!(err, error::key_not_found(URL, "missing"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_url_is_not_found() -> Result<()> {
        let source = source()?;
        let kid = jwk::KeyIdRef::from_str(test::rsa::TEST_KEY_ID);
        assert!(source.fetch("https://elsewhere.example.com", kid).await.is_err());
        Ok(())
    }
}

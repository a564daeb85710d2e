use serde::{Deserialize, Serialize};

use crate::{jwa, jwk, Jwk};

/// A JSON Web Key Set (JWKS)
///
/// Entries that cannot be understood as a supported JWK are skipped when
/// deserializing, so one unusual key does not make the whole set unusable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// A view of the keys in this set
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// The first key with the given key ID
    #[must_use]
    pub fn find(&self, kid: &jwk::KeyIdRef) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.key_id() == Some(kid))
    }

    /// The best key with the given key ID that can be used with `alg`
    ///
    /// Keys pinned to `alg` are preferred over unpinned keys, and keys marked
    /// for signature use over keys with no stated use.
    #[must_use]
    pub fn find_for(&self, kid: &jwk::KeyIdRef, alg: jwa::Algorithm) -> Option<&Jwk> {
        let alg_usage = alg.to_usage();

        let best = self.keys.iter().fold(None, move |best, k| {
            let mut score = 0;

            if k.key_id() != Some(kid) || !k.is_compatible(alg) {
                return best;
            }

            if k.algorithm() == Some(alg) {
                score += 2;
            }

            if let Some(key_usage) = k.usage() {
                if Some(key_usage) == alg_usage {
                    score += 1;
                } else {
                    return best;
                }
            }

            match best {
                Some((_, best_score)) if best_score < score => Some((k, score)),
                None => Some((k, score)),
                _ => best,
            }
        });

        best.map(|(b, _)| b)
    }
}

impl FromIterator<Jwk> for Jwks {
    fn from_iter<T: IntoIterator<Item = Jwk>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct MaybeJwksVisitor;

    impl<'de> serde::de::Visitor<'de> for MaybeJwksVisitor {
        type Value = Vec<Jwk>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of JWK objects")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            let mut index = 0_usize;

            while let Some(value) = seq.next_element()? {
                match value {
                    MaybeJwk::Jwk(jwk) => values.push(jwk),
                    MaybeJwk::Unknown(key) => {
                        tracing::warn!(
                            jwks.idx = index,
                            jwk.kty = ?key.kty,
                            jwk.kid = ?key.kid,
                            jwk.alg = ?key.alg,
                            "ignoring unsupported JWK"
                        );
                    }
                }
                index += 1;
            }

            Ok(values)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeJwk {
        Jwk(Jwk),
        Unknown(JwkLike),
    }

    #[derive(Deserialize)]
    struct JwkLike {
        #[serde(default)]
        kty: Option<String>,
        #[serde(default)]
        kid: Option<jwk::KeyId>,
        #[serde(default)]
        alg: Option<String>,
    }

    deserializer.deserialize_seq(MaybeJwksVisitor)
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use tracing_test::traced_test;

    use super::*;
    use crate::test;

    const JWKS_WITH_ENCRYPTION_KEY: &str = r#"
        {
            "keys": [
                {
                    "kid": "1",
                    "use": "enc",
                    "alg": "RSA-OAEP"
                }
            ]
        }
    "#;

    const JWKS_WITH_NOTHING: &str = r#"
        {
            "keys": [
                {}
            ]
        }
    "#;

    #[test]
    #[traced_test]
    fn skips_keys_without_key_type() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS_WITH_ENCRYPTION_KEY)?;
        assert!(jwks.keys().is_empty());
        assert!(logs_contain("ignoring unsupported JWK"));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn skips_empty_entries() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS_WITH_NOTHING)?;
        assert!(jwks.keys().is_empty());
        Ok(())
    }

    #[test]
    fn rejects_non_list_keys() {
        assert!(serde_json::from_str::<Jwks>(r#"{"keys":{}}"#).is_err());
    }

    #[test]
    #[traced_test]
    fn decodes_mixed_set() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(test::mixed::JWKS)?;
        assert_eq!(jwks.keys().len(), 3);
        assert!(logs_contain("ignoring unsupported JWK"));
        Ok(())
    }

    #[test]
    fn finds_keys_by_id() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(test::mixed::JWKS)?;

        let ec = jwks.find(jwk::KeyIdRef::from_str(test::ec::TEST_KEY_ID));
        assert_eq!(ec.map(Jwk::classify), Some(jwk::KeyVariant::EcPublic));
        assert!(jwks.find(jwk::KeyIdRef::from_str("ed25519")).is_none());
        Ok(())
    }

    #[test]
    fn find_for_requires_compatibility() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(test::mixed::JWKS)?;
        let rsa = jwk::KeyIdRef::from_str(test::rsa::TEST_KEY_ID);

        assert!(jwks.find_for(rsa, jwa::Algorithm::RS256).is_some());
        assert!(jwks.find_for(rsa, jwa::Algorithm::PS256).is_none());
        assert!(jwks.find_for(rsa, jwa::Algorithm::HS256).is_none());

        let hmac = jwk::KeyIdRef::from_str(test::hmac::TEST_KEY_ID);
        assert!(jwks.find_for(hmac, jwa::Algorithm::HS512).is_some());
        Ok(())
    }

    #[test]
    fn find_for_prefers_pinned_keys() -> Result<()> {
        let pinned = Jwk::builder()
            .with_key_id("shared")
            .with_algorithm(jwa::Algorithm::HS256)
            .with_octet_params(jwa::hmac::Octet::new("pinned"))
            .build()?;
        let loose = Jwk::builder()
            .with_key_id("shared")
            .with_octet_params(jwa::hmac::Octet::new("loose"))
            .build()?;

        let jwks: Jwks = [loose.clone(), pinned.clone()].into_iter().collect();
        let kid = jwk::KeyIdRef::from_str("shared");
        assert_eq!(jwks.find_for(kid, jwa::Algorithm::HS256), Some(&pinned));
        assert_eq!(jwks.find_for(kid, jwa::Algorithm::HS384), Some(&loose));
        Ok(())
    }

    #[test]
    fn round_trips_through_json() -> Result<()> {
        let mut jwks = Jwks::default();
        jwks.add_key(test::hmac::JWK.parse()?);
        jwks.add_key(test::rsa::JWK.parse()?);

        let json = serde_json::to_string(&jwks)?;
        assert!(json.starts_with(r#"{"keys":[{"kty":"oct""#));
        let roundtrip: Jwks = serde_json::from_str(&json)?;
        assert_eq!(roundtrip, jwks);
        Ok(())
    }
}

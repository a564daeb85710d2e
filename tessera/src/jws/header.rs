use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error, jwa, jwk};

/// A mutable set of JOSE header parameters
///
/// Parameters are written out in the order they were first inserted.
///
/// ```
/// use tessera::{jwa, jws::Headers};
///
/// let headers = Headers::new().with_typ("JWT").with_alg(jwa::Algorithm::HS512);
/// assert_eq!(headers.to_json(), r#"{"typ":"JWT","alg":"HS512"}"#);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Headers(Map<String, Value>);

impl Headers {
    /// An empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the algorithm (`alg`)
    pub fn with_alg(self, alg: jwa::Algorithm) -> Self {
        self.with("alg", alg.name())
    }

    /// Sets the media type (`typ`)
    pub fn with_typ(self, typ: impl Into<String>) -> Self {
        self.with("typ", typ.into())
    }

    /// Sets the key ID (`kid`)
    pub fn with_kid(self, kid: impl Into<jwk::KeyId>) -> Self {
        let kid: jwk::KeyId = kid.into();
        self.with("kid", kid.as_str())
    }

    /// Sets the JWK set URL (`jku`)
    pub fn with_jku(self, jku: impl Into<String>) -> Self {
        self.with("jku", jku.into())
    }

    /// Sets an arbitrary header parameter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets an arbitrary header parameter, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Gets a header parameter
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `alg` parameter, if it is a string
    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.get("alg").and_then(Value::as_str)
    }

    /// Serializes the header set as a compact JSON object
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).expect("JSON maps always serialize")
    }

    pub(crate) fn to_fields(&self) -> HeaderFields {
        HeaderFields::from(self.0.clone())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The recognized members of a protected JOSE header
///
/// Any JSON object is accepted. A recognized member of an unexpected JSON
/// type is treated as absent, except `alg`, which is kept as written so that
/// a token naming an unknown algorithm can still be parsed and then rejected
/// when it is validated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct HeaderFields {
    alg: Option<Value>,
    typ: Option<String>,
    kid: Option<jwk::KeyId>,
    jku: Option<String>,
    jwk: Option<Value>,
    cty: Option<String>,
    enc: Option<String>,
    zip: Option<String>,
    crit: Option<Vec<String>>,
    x5u: Option<String>,
    x5c: Option<Vec<String>>,
    x5t: Option<String>,
    x5t_s256: Option<String>,
}

fn member<T: DeserializeOwned>(header: &Map<String, Value>, name: &str) -> Option<T> {
    header
        .get(name)
        .and_then(|value| T::deserialize(value).ok())
}

impl From<Map<String, Value>> for HeaderFields {
    fn from(header: Map<String, Value>) -> Self {
        Self {
            alg: header.get("alg").cloned(),
            typ: member(&header, "typ"),
            kid: member(&header, "kid"),
            jku: member(&header, "jku"),
            jwk: header.get("jwk").filter(|v| v.is_object()).cloned(),
            cty: member(&header, "cty"),
            enc: member(&header, "enc"),
            zip: member(&header, "zip"),
            crit: member(&header, "crit"),
            x5u: member(&header, "x5u"),
            x5c: member(&header, "x5c"),
            x5t: member(&header, "x5t"),
            x5t_s256: member(&header, "x5t#S256"),
        }
    }
}

impl HeaderFields {
    /// The algorithm name (`alg`), if it is a string
    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.alg.as_ref().and_then(Value::as_str)
    }

    /// Resolves the `alg` member
    ///
    /// An absent `alg` resolves to [`jwa::Algorithm::None`].
    ///
    /// # Errors
    ///
    /// The member is not a string naming a supported algorithm.
    pub fn algorithm(&self) -> Result<jwa::Algorithm, error::UnrecognizedAlgorithm> {
        match &self.alg {
            None => Ok(jwa::Algorithm::None),
            Some(Value::String(name)) => jwa::Algorithm::resolve(Some(name)),
            Some(other) => Err(error::unrecognized_algorithm(other.to_string())),
        }
    }

    /// The media type (`typ`)
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// The key ID (`kid`)
    #[must_use]
    pub fn kid(&self) -> Option<&jwk::KeyIdRef> {
        self.kid.as_deref()
    }

    /// The JWK set URL (`jku`)
    #[must_use]
    pub fn jku(&self) -> Option<&str> {
        self.jku.as_deref()
    }

    /// The embedded key (`jwk`), unparsed
    #[must_use]
    pub fn jwk(&self) -> Option<&Value> {
        self.jwk.as_ref()
    }

    /// The content type (`cty`)
    #[must_use]
    pub fn cty(&self) -> Option<&str> {
        self.cty.as_deref()
    }

    /// The content encryption algorithm (`enc`)
    #[must_use]
    pub fn enc(&self) -> Option<&str> {
        self.enc.as_deref()
    }

    /// The compression algorithm (`zip`)
    #[must_use]
    pub fn zip(&self) -> Option<&str> {
        self.zip.as_deref()
    }

    /// The critical extensions (`crit`)
    ///
    /// These are reported but not processed.
    #[must_use]
    pub fn crit(&self) -> Option<&[String]> {
        self.crit.as_deref()
    }

    /// The X.509 URL (`x5u`)
    #[must_use]
    pub fn x5u(&self) -> Option<&str> {
        self.x5u.as_deref()
    }

    /// The X.509 certificate chain (`x5c`)
    #[must_use]
    pub fn x5c(&self) -> Option<&[String]> {
        self.x5c.as_deref()
    }

    /// The X.509 SHA-1 thumbprint (`x5t`)
    #[must_use]
    pub fn x5t(&self) -> Option<&str> {
        self.x5t.as_deref()
    }

    /// The X.509 SHA-256 thumbprint (`x5t#S256`)
    #[must_use]
    pub fn x5t_s256(&self) -> Option<&str> {
        self.x5t_s256.as_deref()
    }
}

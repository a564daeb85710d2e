//! Implementations of the JSON Web Signature (JWS) standard
//!
//! The specifications for JSON Web Signatures can be found in [RFC7515][].
//! Only the compact serialization is supported:
//!
//! ```text
//! BASE64URL(protected header) "." BASE64URL(payload) "." BASE64URL(signature)
//! ```
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::{fmt, str::FromStr};

use tessera_base64::{Base64Url, Base64UrlRef};

use crate::{error, jwa, Jwk};

mod builder;
mod header;
mod signer;

pub use builder::JwsBuilder;
pub use header::{HeaderFields, Headers};
pub use signer::{create_signer, EcdsaSigner, HmacSigner, RsaSigner, Signer};

/// A signed JWS
///
/// The protected header and payload are kept exactly as they were signed, so
/// re-serializing a parsed token reproduces it byte for byte.
#[derive(Clone, PartialEq, Eq)]
#[must_use]
pub struct Jws {
    protected: String,
    payload: String,
    signature: Base64Url,
    header: HeaderFields,
    headers: Option<Headers>,
}

impl Jws {
    /// Starts building a new JWS
    pub fn builder<'a>() -> JwsBuilder<'a> {
        JwsBuilder::default()
    }

    fn unsigned(protected: String, header: HeaderFields, payload: String) -> Self {
        Self {
            protected,
            payload,
            signature: Base64Url::new(),
            header,
            headers: None,
        }
    }

    /// Parses a compact serialization
    ///
    /// # Errors
    ///
    /// * The token does not have exactly three segments
    /// * A segment is not valid base64url
    /// * The header is not a UTF-8 JSON object, or the payload is not UTF-8
    pub fn parse(token: &str) -> Result<Self, error::JwsParseError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [h_str, p_str, s_str] = segments[..] else {
            return Err(error::malformed_jws(segments.len()).into());
        };

        let h_raw = Base64Url::from_encoded(h_str).map_err(error::malformed_jws_header)?;
        let protected = String::from_utf8(h_raw.into_inner()).map_err(error::malformed_jws_header)?;
        let header: HeaderFields =
            serde_json::from_str(&protected).map_err(error::malformed_jws_header)?;

        let p_raw = Base64Url::from_encoded(p_str).map_err(error::malformed_jws_payload)?;
        let payload = String::from_utf8(p_raw.into_inner()).map_err(error::malformed_jws_payload)?;

        let signature = Base64Url::from_encoded(s_str).map_err(error::malformed_jws_signature)?;

        Ok(Self {
            protected,
            payload,
            signature,
            header,
            headers: None,
        })
    }

    /// Reassembles a signed JWS from its decoded parts
    ///
    /// # Errors
    ///
    /// The header is not a JSON object.
    pub fn from_parts(
        header: impl Into<String>,
        payload: impl Into<String>,
        signature: impl Into<Base64Url>,
    ) -> Result<Self, error::MalformedJwsHeader> {
        let protected = header.into();
        let fields = serde_json::from_str(&protected).map_err(error::malformed_jws_header)?;

        Ok(Self {
            signature: signature.into(),
            ..Self::unsigned(protected, fields, payload.into())
        })
    }

    /// The compact serialization
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut token = self.signing_input();
        token.push('.');
        token.push_str(&self.signature.encode());
        token
    }

    /// The exact text the signature covers
    #[must_use]
    pub fn signing_input(&self) -> String {
        format!(
            "{}.{}",
            tessera_base64::encode(&self.protected),
            tessera_base64::encode(&self.payload)
        )
    }

    /// The recognized members of the protected header
    pub fn header(&self) -> &HeaderFields {
        &self.header
    }

    /// The protected header JSON exactly as signed
    #[must_use]
    pub fn protected_header(&self) -> &str {
        &self.protected
    }

    /// The full header set the JWS was built with
    ///
    /// Tokens obtained by parsing carry only their protected header.
    #[must_use]
    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// The payload
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The signature
    #[must_use]
    pub fn signature(&self) -> &Base64UrlRef {
        &self.signature
    }

    /// Resolves the protected header `alg`
    ///
    /// # Errors
    ///
    /// The name is not a supported algorithm.
    pub fn algorithm(&self) -> Result<jwa::Algorithm, error::UnrecognizedAlgorithm> {
        self.header.algorithm()
    }

    /// Parses the key embedded in the protected header (`jwk`), if any
    #[must_use]
    pub fn embedded_jwk(&self) -> Option<Result<Jwk, error::JwkError>> {
        self.header.jwk().cloned().map(Jwk::from_value)
    }
}

impl FromStr for Jws {
    type Err = error::JwsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Prints the protected header and payload, but only the first few
/// characters of the signature. A width in the format string changes how
/// many, i.e. `{:20?}`.
///
/// ```
/// use tessera::Jws;
///
/// let jws = Jws::parse("eyJhbGciOiJIUzI1NiJ9.aGk.2N5yyY2UjqlUKSSCpFVWzfixfBRTWahiN2PrUuiuxbE")?;
/// let debug = format!("{:?}", jws);
/// assert!(debug.contains(r#"signature: "2N5yyY2…""#));
/// assert!(!debug.contains("2N5yyY2U"));
/// # Ok::<(), tessera::error::JwsParseError>(())
/// ```
impl fmt::Debug for Jws {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Jws")
            .field("header", &self.protected)
            .field("payload", &self.payload)
            .field("signature", &LimitedReveal(&self.signature.encode()))
            .finish()
    }
}

struct LimitedReveal<'a>(&'a str);

impl fmt::Debug for LimitedReveal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("\"")?;
        limited_reveal(self.0, f, 8)?;
        f.write_str("\"")
    }
}

fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

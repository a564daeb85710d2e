//! URL-safe base64 without padding, as used throughout JOSE
//!
//! Every byte sequence that crosses a JSON or wire boundary in JOSE is written
//! in the URL-safe alphabet of [RFC4648 §5][rfc4648] with the trailing `=`
//! padding stripped. This crate provides the two free functions [`encode()`]
//! and [`decode()`] for that codec, along with [`Base64Url`] and
//! [`Base64UrlRef`], owned and borrowed byte buffers that hold raw bytes but
//! display, debug and serialize as base64url.
//!
//! Costs of conversion between base64url and raw bytes only occur for calls
//! to [`Base64Url::from_encoded()`] or when formatting the value.
//!
//! The underlying encoding/decoding mechanism is provided by the [`base64`][]
//! crate.
//!
//!   [rfc4648]: https://tools.ietf.org/html/rfc4648#section-5
//!   [`base64`]: https://docs.rs/base64
//!
//! # Unsafe code
//!
//! [`Base64UrlRef::from_slice()`] reinterprets a borrowed `[u8]` as a
//! `Base64UrlRef`. The type is `#[repr(transparent)]` over `[u8]`, so the
//! two share a representation. That is the only unsafe block in the crate,
//! which is why it uses `#![deny(unsafe_code)]` rather than `forbid`.
//!
//! # Example
//!
//! ```
//! use tessera_base64::{decode, encode, Base64Url};
//!
//! let enc = encode("👋 hello, world! 👋");
//! assert_eq!(enc, "8J-RiyBoZWxsbywgd29ybGQhIPCfkYs");
//! assert_eq!(decode(&enc).unwrap(), "👋 hello, world! 👋".as_bytes());
//!
//! let data = Base64Url::from_raw("👋 hello, world! 👋");
//! assert_eq!(format!("{}", data), "8J-RiyBoZWxsbywgd29ybGQhIPCfkYs");
//! assert_eq!(format!("{:?}", data), "`8J-RiyBoZWxsbywgd29ybGQhIPCfkYs`");
//! ```
//!
//! # Serde
//!
//! With the `serde` feature enabled, [`Base64Url`] serializes as a base64url
//! string and deserializes by decoding one.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{borrow::Borrow, error::Error, fmt, ops::Deref};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// An error while decoding a value which is not properly formatted
/// base64url data
///
/// Raised for characters outside the URL-safe alphabet, for padding
/// characters, and for inputs whose length leaves a remainder of one when
/// divided by four, which no encoder can produce.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeError {
    source: base64::DecodeError,
}

impl From<base64::DecodeError> for DecodeError {
    fn from(err: base64::DecodeError) -> Self {
        Self { source: err }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid base64url data")
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Encodes bytes as URL-safe base64 with no padding
#[must_use]
pub fn encode<T: AsRef<[u8]>>(raw: T) -> String {
    URL_SAFE_NO_PAD.encode(raw)
}

/// Decodes URL-safe base64 with no padding
///
/// # Errors
///
/// The input contains characters outside of the URL-safe alphabet, contains
/// padding, or has a length that is one more than a multiple of four.
pub fn decode<T: AsRef<[u8]>>(enc: T) -> Result<Vec<u8>, DecodeError> {
    Ok(URL_SAFE_NO_PAD.decode(enc)?)
}

/// Owned data to be encoded as URL-safe base64 (no padding)
///
/// Encoding alphabet: `A`–`Z`, `a`–`z`, `0`–`9`, `-`, `_`
///
/// Data is held in memory in its raw form. Costs of encoding are only
/// incurred when serializing or displaying the value.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Creates an empty buffer
    #[inline]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a new buffer from an owned value
    ///
    /// To decode a base64url-encoded buffer, use [`from_encoded()`][Self::from_encoded()].
    #[inline]
    pub fn from_raw<T: Into<Vec<u8>>>(raw: T) -> Self {
        Self(raw.into())
    }

    /// Constructs a new buffer by decoding base64url text
    ///
    /// # Errors
    ///
    /// Same conditions as [`decode()`].
    pub fn from_encoded<T: AsRef<[u8]>>(enc: T) -> Result<Self, DecodeError> {
        decode(enc).map(Self)
    }

    /// Unwraps the underlying buffer
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Calculates the length of the base64url encoding for a buffer of size `len`
    #[inline]
    #[must_use]
    pub const fn calc_encoded_len(len: usize) -> usize {
        let d = len / 3 * 4;
        match len % 3 {
            0 => d,
            m => d + m + 1,
        }
    }
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(buf: Vec<u8>) -> Self {
        Self(buf)
    }
}

impl From<&'_ [u8]> for Base64Url {
    #[inline]
    fn from(slice: &[u8]) -> Self {
        Self::from_raw(slice)
    }
}

impl From<&'_ Base64UrlRef> for Base64Url {
    #[inline]
    fn from(val: &Base64UrlRef) -> Self {
        val.to_owned()
    }
}

impl From<Base64Url> for Vec<u8> {
    #[inline]
    fn from(val: Base64Url) -> Self {
        val.0
    }
}

impl Borrow<Base64UrlRef> for Base64Url {
    #[inline]
    fn borrow(&self) -> &Base64UrlRef {
        self
    }
}

impl Deref for Base64Url {
    type Target = Base64UrlRef;

    #[inline]
    fn deref(&self) -> &Self::Target {
        Base64UrlRef::from_slice(self.0.as_slice())
    }
}

impl AsRef<Base64UrlRef> for Base64Url {
    #[inline]
    fn as_ref(&self) -> &Base64UrlRef {
        self
    }
}

impl fmt::Display for Base64Url {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl fmt::Debug for Base64Url {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Serialize the underlying byte array as a base64url string
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl serde::Serialize for Base64Url {
    #[inline]
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (**self).serialize(serializer)
    }
}

/// Deserialize a base64url string and decode it into a byte array
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> serde::Deserialize<'de> for Base64Url {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let enc = String::deserialize(deserializer)?;
        Self::from_encoded(enc).map_err(serde::de::Error::custom)
    }
}

/// Borrowed data to be encoded as URL-safe base64 (no padding)
///
/// Encoding alphabet: `A`–`Z`, `a`–`z`, `0`–`9`, `-`, `_`
#[derive(Hash, PartialEq, Eq)]
#[repr(transparent)]
pub struct Base64UrlRef([u8]);

impl Base64UrlRef {
    /// Transparently reinterprets the slice as base64url
    #[allow(unsafe_code)]
    #[inline]
    #[must_use]
    pub fn from_slice(raw: &[u8]) -> &Self {
        let ptr: *const [u8] = raw;

        // This type is a transparent wrapper around an `[u8]`, so this
        // transformation is safe to do.
        unsafe { &*(ptr as *const Self) }
    }

    /// Calculates the length of the base64url encoding of this buffer
    #[inline]
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        Base64Url::calc_encoded_len(self.0.len())
    }

    /// Provides access to the underlying slice
    #[inline]
    #[must_use]
    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Encodes the underlying bytes
    #[inline]
    #[must_use]
    pub fn encode(&self) -> String {
        encode(&self.0)
    }
}

impl<'a> From<&'a [u8]> for &'a Base64UrlRef {
    #[inline]
    fn from(slice: &'a [u8]) -> Self {
        Base64UrlRef::from_slice(slice)
    }
}

impl ToOwned for Base64UrlRef {
    type Owned = Base64Url;

    #[inline]
    fn to_owned(&self) -> Self::Owned {
        Base64Url(self.0.to_owned())
    }
}

impl PartialEq<Base64UrlRef> for Base64Url {
    #[inline]
    fn eq(&self, other: &Base64UrlRef) -> bool {
        self.0 == other.0
    }
}

impl PartialEq<Base64Url> for Base64UrlRef {
    #[inline]
    fn eq(&self, other: &Base64Url) -> bool {
        self.0 == *other.0
    }
}

impl fmt::Display for Base64UrlRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Base64UrlRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}`", self.encode())
    }
}

/// Serialize the underlying byte array as a base64url string
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl serde::Serialize for Base64UrlRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

#[cfg(doctest)]
#[doc(hidden)]
mod doctests {
    /// Verifies that `from_slice` does not extend lifetimes
    ///
    /// ```compile_fail
    /// use tessera_base64::Base64UrlRef;
    ///
    /// let b64 = {
    ///     let data = vec![0; 16];
    ///     Base64UrlRef::from_slice(data.as_slice())
    /// };
    ///
    /// println!("{}", b64);
    /// ```
    fn from_slice_does_not_extend_lifetimes() -> ! {
        loop {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC7515_PAYLOAD: &str =
        "{\"iss\":\"joe\",\r\n \"exp\":1300819380,\r\n \"http://example.com/is_root\":true}";

    #[test]
    fn encodes_rfc7515_example_payload() {
        assert_eq!(
            encode(RFC7515_PAYLOAD),
            "eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ"
        );
    }

    #[test]
    fn round_trips_awkward_inputs() -> color_eyre::Result<()> {
        let cases: &[&[u8]] = &[
            b"",
            b"+",
            b"/",
            b"=",
            b"+/=",
            b"a+b/c=d==",
            "añb€c😀".as_bytes(),
            &[0xfb, 0xff, 0xbf, 0x00, 0x3e, 0x3f],
        ];

        for &case in cases {
            let enc = encode(case);
            assert!(!enc.contains(['+', '/', '=']), "{enc} is not url-safe");
            assert_eq!(decode(&enc)?, case);
        }

        Ok(())
    }

    #[test]
    fn encodes_without_padding_in_url_alphabet() {
        assert_eq!(encode([0xfb, 0xff]), "-_8");
        assert_eq!(encode("a"), "YQ");
        assert_eq!(encode("ab"), "YWI");
        assert_eq!(encode("abc"), "YWJj");
    }

    #[test]
    fn rejects_impossible_length() {
        assert!(decode("a").is_err());
        assert!(decode("abcde").is_err());
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        assert!(decode("ab+c").is_err());
        assert!(decode("ab/c").is_err());
        assert!(decode("ab c").is_err());
        assert!(decode("INVALID!!!").is_err());
    }

    #[test]
    fn rejects_padding() {
        assert!(decode("YQ==").is_err());
        assert!(decode("YWI=").is_err());
    }

    #[test]
    fn encoded_len_matches_encoding() {
        for len in 0..16 {
            let data = Base64Url::from_raw(vec![0x5a; len]);
            assert_eq!(data.encoded_len(), data.to_string().len());
        }
    }

    #[test]
    fn wrapper_decodes_into_raw_bytes() -> color_eyre::Result<()> {
        let data = Base64Url::from_encoded("8J-RiyBoZWxsbywgd29ybGQhIPCfkYs")?;
        assert_eq!(data.as_slice(), "👋 hello, world! 👋".as_bytes());
        assert_eq!(data.to_string(), "8J-RiyBoZWxsbywgd29ybGQhIPCfkYs");
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() -> color_eyre::Result<()> {
        #[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct Envelope {
            data: Base64Url,
        }

        let value = Envelope {
            data: Base64Url::from_raw(&b"\xfb\xff"[..]),
        };

        let json = serde_json::to_string(&value)?;
        assert_eq!(json, r#"{"data":"-_8"}"#);
        assert_eq!(serde_json::from_str::<Envelope>(&json)?, value);
        assert!(serde_json::from_str::<Envelope>(r#"{"data":"-_8="}"#).is_err());
        Ok(())
    }
}

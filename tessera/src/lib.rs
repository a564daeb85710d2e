//! This crate implements the signing half of the JavaScript/JSON Object
//! Signing and Encryption (JOSE) standards:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Key (JWK): [RFC7517][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//!
//! Only the compact JWS serialization is supported. JSON Web Encryption (JWE),
//! [RFC7516][], is not.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7516]: https://tools.ietf.org/html/rfc7516
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//!
//! # Example
//!
//! ```
//! use tessera::{jwa, jws::Headers, validate::Validator, Jwk, Jws};
//!
//! let key: Jwk = r#"{
//!     "kty": "oct",
//!     "kid": "rfc7515-a1",
//!     "k": "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow"
//! }"#.parse()?;
//!
//! let headers = Headers::new().with_typ("JWT").with_alg(jwa::Algorithm::HS512);
//! let jws = Jws::builder()
//!     .with_headers(headers.clone())
//!     .with_protected_headers(headers)
//!     .with_payload("{\"iss\":\"joe\",\r\n \"exp\":1300819380,\r\n \"http://example.com/is_root\":true}")
//!     .with_jwk(&key)
//!     .build()?;
//!
//! let token = jws.serialize();
//! assert!(token.ends_with(".wMe9O5ib30FnrKqxc8yHdcMCC6waAZZ7O8oP1fv8tNQ3f4iC71FWtTQ7UaK_ERrm7mmf7HYmaRsQTs-phfsy7g"));
//!
//! let parsed = Jws::parse(&token)?;
//! let validator = Validator::default().add_approved_algorithm(jwa::Algorithm::HS512);
//! assert!(validator.validate(&parsed, &key)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
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

pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod source;
pub mod validate;


#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jws::Jws;

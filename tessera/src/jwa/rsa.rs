//! RSA JSON Web Algorithm implementations
//!
//! Covers both RSASSA-PKCS1-v1_5 (`RS*`) and RSASSA-PSS (`PS*`). PSS uses a
//! salt as long as the digest output and MGF1 with the same digest.

mod private;
mod public;

pub use private::{OtherPrime, PrivateKey};
pub use public::PublicKey;

use ring::signature::{self, RsaEncoding, RsaParameters};

use crate::jwa::{Algorithm, Digest, Family};

fn verification_params(alg: Algorithm) -> Option<&'static RsaParameters> {
    let params = match (alg.family(), alg.digest()?) {
        (Family::RsaPkcs1, Digest::Sha256) => &signature::RSA_PKCS1_2048_8192_SHA256,
        (Family::RsaPkcs1, Digest::Sha384) => &signature::RSA_PKCS1_2048_8192_SHA384,
        (Family::RsaPkcs1, Digest::Sha512) => &signature::RSA_PKCS1_2048_8192_SHA512,
        (Family::RsaPss, Digest::Sha256) => &signature::RSA_PSS_2048_8192_SHA256,
        (Family::RsaPss, Digest::Sha384) => &signature::RSA_PSS_2048_8192_SHA384,
        (Family::RsaPss, Digest::Sha512) => &signature::RSA_PSS_2048_8192_SHA512,
        _ => return None,
    };

    Some(params)
}

fn padding(alg: Algorithm) -> Option<&'static dyn RsaEncoding> {
    let padding: &'static dyn RsaEncoding = match (alg.family(), alg.digest()?) {
        (Family::RsaPkcs1, Digest::Sha256) => &signature::RSA_PKCS1_SHA256,
        (Family::RsaPkcs1, Digest::Sha384) => &signature::RSA_PKCS1_SHA384,
        (Family::RsaPkcs1, Digest::Sha512) => &signature::RSA_PKCS1_SHA512,
        (Family::RsaPss, Digest::Sha256) => &signature::RSA_PSS_SHA256,
        (Family::RsaPss, Digest::Sha384) => &signature::RSA_PSS_SHA384,
        (Family::RsaPss, Digest::Sha512) => &signature::RSA_PSS_SHA512,
        _ => return None,
    };

    Some(padding)
}

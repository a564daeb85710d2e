use std::fmt;

use serde::{Deserialize, Serialize};

/// The intended use for a JWK
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum Usage {
    /// The key is intended for signing and verification
    #[serde(rename = "sig")]
    Signing,

    /// The key is intended for encryption
    #[serde(rename = "enc")]
    Encryption,
}

/// An operation a JWK may be used for, as listed in `key_ops`
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub enum KeyOperation {
    /// Compute a digital signature or MAC
    Sign,
    /// Verify a digital signature or MAC
    Verify,
    /// Encrypt content
    Encrypt,
    /// Decrypt content and validate decryption
    Decrypt,
    /// Encrypt a key
    WrapKey,
    /// Decrypt a key and validate decryption
    UnwrapKey,
    /// Derive a key
    DeriveKey,
    /// Derive bits not to be used as a key
    DeriveBits,
}

impl fmt::Display for KeyOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::WrapKey => "wrapKey",
            Self::UnwrapKey => "unwrapKey",
            Self::DeriveKey => "deriveKey",
            Self::DeriveBits => "deriveBits",
        };

        f.write_str(s)
    }
}

use tessera_base64::{Base64Url, Base64UrlRef};

use crate::{error, jwa};

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq)]
#[must_use]
pub struct PublicKey {
    modulus: Base64Url,
    exponent: Base64Url,
}

impl PublicKey {
    /// Constructs a public key from the modulus (`n`) and exponent (`e`)
    pub fn new(modulus: impl Into<Base64Url>, exponent: impl Into<Base64Url>) -> Self {
        Self {
            modulus: modulus.into(),
            exponent: exponent.into(),
        }
    }

    /// The public key's modulus
    #[must_use]
    pub fn modulus(&self) -> &Base64UrlRef {
        &self.modulus
    }

    /// The public key's exponent
    #[must_use]
    pub fn exponent(&self) -> &Base64UrlRef {
        &self.exponent
    }

    /// Size of the modulus in bits
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        let n = self.modulus.as_slice();
        match n.iter().position(|&b| b != 0) {
            Some(start) => (n.len() - start) * 8 - n[start].leading_zeros() as usize,
            None => 0,
        }
    }

    /// Verifies `signature` over `data` with the algorithm's padding and digest
    pub(crate) fn verify(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::SignatureMismatch> {
        let params = super::verification_params(alg).ok_or_else(error::signature_mismatch)?;

        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(params, data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_modulus_bits_without_leading_zeros() {
        let key = PublicKey::new(vec![0, 0x01, 0xff], vec![1, 0, 1]);
        assert_eq!(key.modulus_bits(), 9);

        let key = PublicKey::new(vec![0x80; 256], vec![1, 0, 1]);
        assert_eq!(key.modulus_bits(), 2048);

        assert_eq!(PublicKey::new(Vec::new(), vec![3]).modulus_bits(), 0);
    }
}

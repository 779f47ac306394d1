//! RSA Operations
//!
//! PKCS#8 decoding and SHA-256 RSASSA-PKCS1-v1_5 signing using the rsa crate.

use log::debug;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use sha2::Sha256;

use super::CryptoError;

/// RSA Operations
pub struct RsaOperations;

impl RsaOperations {
    /// Decode a DER encoded PKCS#8 RSA private key
    pub fn decode_pkcs8(der: &[u8]) -> Result<RsaPrivateKey, CryptoError> {
        RsaPrivateKey::from_pkcs8_der(der).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Sign with SHA-256 and PKCS#1 v1.5 padding ("SHA256withRSA")
    ///
    /// The data is hashed here; callers pass the message, not a digest.
    pub fn sign_sha256(private_key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        debug!("RSA-{} signing {} bytes", private_key.size() * 8, data.len());

        let signing_key = SigningKey::<Sha256>::new(private_key.clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        Ok(signature.to_vec())
    }
}

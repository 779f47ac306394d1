//! NIST ECC Operations (P-256, P-384)
//!
//! PKCS#8 decoding and SHA-256 ECDSA signing using the p256 and p384 crates.

use log::debug;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature as P256Signature, SigningKey as P256SigningKey};
use p256::pkcs8::DecodePrivateKey;
use p384::ecdsa::{Signature as P384Signature, SigningKey as P384SigningKey};
use sha2::{Digest, Sha256};

use super::CryptoError;

/// ECC curve types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccCurve {
    P256,
    P384,
}

/// A decoded ECDSA private key
#[derive(Clone)]
pub enum EccPrivateKey {
    P256(P256SigningKey),
    P384(P384SigningKey),
}

impl std::fmt::Debug for EccPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print key material
        write!(f, "EccPrivateKey({:?})", self.curve())
    }
}

impl EccPrivateKey {
    pub fn curve(&self) -> EccCurve {
        match self {
            EccPrivateKey::P256(_) => EccCurve::P256,
            EccPrivateKey::P384(_) => EccCurve::P384,
        }
    }
}

/// NIST ECC Operations
pub struct EccNistOperations;

impl EccNistOperations {
    /// Decode a DER encoded PKCS#8 EC private key on the given curve
    pub fn decode_pkcs8(curve: EccCurve, der: &[u8]) -> Result<EccPrivateKey, CryptoError> {
        match curve {
            EccCurve::P256 => P256SigningKey::from_pkcs8_der(der)
                .map(EccPrivateKey::P256)
                .map_err(|e| CryptoError::InvalidKey(e.to_string())),
            EccCurve::P384 => P384SigningKey::from_pkcs8_der(der)
                .map(EccPrivateKey::P384)
                .map_err(|e| CryptoError::InvalidKey(e.to_string())),
        }
    }

    /// Sign with SHA-256 and ECDSA ("SHA256withECDSA")
    ///
    /// The signature is DER encoded (SEQUENCE of r and s).
    pub fn sign_sha256(key: &EccPrivateKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        debug!("ECDSA {:?} signing {} bytes", key.curve(), data.len());

        let digest = Sha256::digest(data);
        match key {
            EccPrivateKey::P256(signing_key) => {
                let signature: P256Signature = signing_key
                    .sign_prehash(&digest)
                    .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            EccPrivateKey::P384(signing_key) => {
                let signature: P384Signature = signing_key
                    .sign_prehash(&digest)
                    .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }
}

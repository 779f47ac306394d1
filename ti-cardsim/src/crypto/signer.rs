//! Card key signing
//!
//! Card images store private keys as base64 PKCS#8. The signature family is
//! not recorded anywhere else, so it is inferred from the key's algorithm
//! identifier.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use rsa::RsaPrivateKey;

use super::ecc_nist::{EccCurve, EccNistOperations, EccPrivateKey};
use super::rsa::RsaOperations;
use super::CryptoError;

/// rsaEncryption
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
/// id-ecPublicKey
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// secp256r1
const CURVE_P256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
/// secp384r1
const CURVE_P384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// Signature family of a card key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec(EccCurve),
}

/// A decoded card private key
#[derive(Debug, Clone)]
pub enum CardPrivateKey {
    Rsa(RsaPrivateKey),
    Ec(EccPrivateKey),
}

impl CardPrivateKey {
    /// Decode a base64 PKCS#8 private key as stored in card images
    pub fn from_base64_pkcs8(encoded: &str) -> Result<Self, CryptoError> {
        let der = STANDARD.decode(encoded.trim())?;
        Self::from_pkcs8_der(&der)
    }

    /// Decode a DER PKCS#8 private key, inferring its family
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, CryptoError> {
        let info =
            PrivateKeyInfo::try_from(der).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        let algorithm = info.algorithm.oid;
        if algorithm == RSA_ENCRYPTION {
            return RsaOperations::decode_pkcs8(der).map(CardPrivateKey::Rsa);
        }
        if algorithm != EC_PUBLIC_KEY {
            return Err(CryptoError::UnsupportedAlgorithm(algorithm.to_string()));
        }

        let curve_oid = info
            .algorithm
            .parameters_oid()
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let curve = if curve_oid == CURVE_P256 {
            EccCurve::P256
        } else if curve_oid == CURVE_P384 {
            EccCurve::P384
        } else {
            // brainpool curves of real health cards end up here
            return Err(CryptoError::UnsupportedCurve(curve_oid.to_string()));
        };

        EccNistOperations::decode_pkcs8(curve, der).map(CardPrivateKey::Ec)
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            CardPrivateKey::Rsa(_) => KeyFamily::Rsa,
            CardPrivateKey::Ec(key) => KeyFamily::Ec(key.curve()),
        }
    }

    /// Sign `data` with the family's SHA-256 default algorithm
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            CardPrivateKey::Rsa(key) => RsaOperations::sign_sha256(key, data),
            CardPrivateKey::Ec(key) => EccNistOperations::sign_sha256(key, data),
        }
    }
}

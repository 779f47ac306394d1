//! Cryptographic Operations
//!
//! Key decoding and signing for PSO: Compute Digital Signature.

pub mod ecc_nist;
pub mod rsa;
pub mod signer;

pub use self::ecc_nist::{EccCurve, EccNistOperations, EccPrivateKey};
pub use self::rsa::RsaOperations;
pub use self::signer::{CardPrivateKey, KeyFamily};

use thiserror::Error;

/// Errors from key decoding and signing
///
/// These indicate a broken card image, not a protocol condition.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Private key is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Unsupported key algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported elliptic curve {0}")]
    UnsupportedCurve(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

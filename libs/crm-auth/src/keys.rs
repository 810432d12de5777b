//! Parsed key material.
//!
//! All parsing happens once, at service construction, so a bad key surfaces
//! as a startup failure rather than on the first request.

use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::ExposeSecret;

use crate::config::KeyPairPem;
use crate::errors::TokenError;

/// RSA pair for access-token encryption.
pub struct AccessKeys {
    pub(crate) encrypt: RsaPublicKey,
    pub(crate) decrypt: RsaPrivateKey,
}

/// RSA pair for refresh-token signatures.
pub struct RefreshKeys {
    pub(crate) sign: EncodingKey,
    pub(crate) verify: DecodingKey,
}

impl AccessKeys {
    /// # Errors
    /// `Crypto` if either half fails to parse or the halves do not belong together.
    pub fn from_pem(label: &str, pem: &KeyPairPem) -> Result<Self, TokenError> {
        let decrypt = parse_private_key(label, pem.private_pem.expose_secret())?;
        let encrypt = parse_public_key(label, &pem.public_pem)?;
        if RsaPublicKey::from(&decrypt) != encrypt {
            return Err(TokenError::crypto(format!(
                "{label}: public key does not match private key"
            )));
        }
        Ok(Self { encrypt, decrypt })
    }
}

impl RefreshKeys {
    /// # Errors
    /// `Crypto` if either half fails to parse or the halves do not belong together.
    pub fn from_pem(label: &str, pem: &KeyPairPem) -> Result<Self, TokenError> {
        let private_pem = pem.private_pem.expose_secret();

        // Same pairing check as for access keys; jsonwebtoken keys are opaque.
        let private = parse_private_key(label, private_pem)?;
        let public = parse_public_key(label, &pem.public_pem)?;
        if RsaPublicKey::from(&private) != public {
            return Err(TokenError::crypto(format!(
                "{label}: public key does not match private key"
            )));
        }

        let sign = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| TokenError::crypto(format!("{label}: signing key: {e}")))?;
        let verify = DecodingKey::from_rsa_pem(pem.public_pem.as_bytes())
            .map_err(|e| TokenError::crypto(format!("{label}: verification key: {e}")))?;
        Ok(Self { sign, verify })
    }
}

/// Accepts PKCS#1 (`RSA PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) PEM.
pub(crate) fn parse_private_key(label: &str, pem: &str) -> Result<RsaPrivateKey, TokenError> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| TokenError::crypto(format!("{label}: invalid RSA private key: {e}")))
}

/// Accepts PKCS#1 (`RSA PUBLIC KEY`) and SPKI (`PUBLIC KEY`) PEM.
pub(crate) fn parse_public_key(label: &str, pem: &str) -> Result<RsaPublicKey, TokenError> {
    RsaPublicKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPublicKey::from_public_key_pem(pem))
        .map_err(|e| TokenError::crypto(format!("{label}: invalid RSA public key: {e}")))
}

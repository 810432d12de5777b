//! Compact JWE serialization for access tokens.
//!
//! `BASE64URL(header).BASE64URL(encrypted_key).BASE64URL(iv).BASE64URL(ciphertext).BASE64URL(tag)`
//! with `alg = RSA-OAEP-256` and `enc = A256GCM`. The encoded protected
//! header is the GCM additional authenticated data, so header tampering
//! fails the tag check like any other modification.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::errors::TokenError;

pub const ALG: &str = "RSA-OAEP-256";
pub const ENC: &str = "A256GCM";

const CEK_LEN: usize = 32;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct ProtectedHeader {
    alg: String,
    enc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Encrypt `plaintext` to `recipient`.
///
/// # Errors
/// `Crypto` if key wrapping or content encryption fails.
pub fn encrypt(plaintext: &[u8], recipient: &RsaPublicKey) -> Result<String, TokenError> {
    let header = ProtectedHeader {
        alg: ALG.to_owned(),
        enc: ENC.to_owned(),
        typ: Some("JWT".to_owned()),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|e| TokenError::crypto(format!("jwe header: {e}")))?;
    let header_b64 = B64.encode(header_json);

    let mut cek = Zeroizing::new([0u8; CEK_LEN]);
    OsRng.fill_bytes(&mut cek[..]);
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let encrypted_key = recipient
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &cek[..])
        .map_err(|e| TokenError::crypto(format!("jwe key wrap: {e}")))?;

    let cipher = Aes256Gcm::new_from_slice(&cek[..])
        .map_err(|e| TokenError::crypto(format!("jwe cek: {e}")))?;
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: plaintext,
                aad: header_b64.as_bytes(),
            },
        )
        .map_err(|_| TokenError::crypto("jwe content encryption failed"))?;
    let (ciphertext, tag) = sealed.split_at(sealed.len().saturating_sub(TAG_LEN));

    Ok(format!(
        "{header_b64}.{}.{}.{}.{}",
        B64.encode(encrypted_key),
        B64.encode(iv),
        B64.encode(ciphertext),
        B64.encode(tag)
    ))
}

/// Decrypt a compact JWE produced by [`encrypt`].
///
/// # Errors
/// - `Malformed` when the token does not have the JWE shape, uses another
///   algorithm, or has undecodable segments.
/// - `InvalidSignature` when key unwrapping or the GCM tag check fails
///   (wrong key or tampered token).
pub fn decrypt(token: &str, key: &RsaPrivateKey) -> Result<Vec<u8>, TokenError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(ek_b64), Some(iv_b64), Some(ct_b64), Some(tag_b64), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(TokenError::malformed("expected 5 dot-separated segments"));
    };

    let header: ProtectedHeader = serde_json::from_slice(&decode_segment("header", header_b64)?)
        .map_err(|e| TokenError::malformed(format!("header: {e}")))?;
    if header.alg != ALG || header.enc != ENC {
        return Err(TokenError::malformed(format!(
            "unsupported alg/enc {}/{}",
            header.alg, header.enc
        )));
    }

    let encrypted_key = decode_segment("encrypted key", ek_b64)?;
    let iv = decode_segment("iv", iv_b64)?;
    let mut sealed = decode_segment("ciphertext", ct_b64)?;
    let tag = decode_segment("tag", tag_b64)?;
    if iv.len() != IV_LEN {
        return Err(TokenError::malformed("iv must be 96 bits"));
    }
    if tag.len() != TAG_LEN {
        return Err(TokenError::malformed("tag must be 128 bits"));
    }

    let cek = Zeroizing::new(
        key.decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), &encrypted_key)
            .map_err(|_| TokenError::InvalidSignature)?,
    );
    if cek.len() != CEK_LEN {
        return Err(TokenError::InvalidSignature);
    }

    let cipher = Aes256Gcm::new_from_slice(&cek).map_err(|_| TokenError::InvalidSignature)?;
    sealed.extend_from_slice(&tag);
    cipher
        .decrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: &sealed,
                aad: header_b64.as_bytes(),
            },
        )
        .map_err(|_| TokenError::InvalidSignature)
}

fn decode_segment(what: &str, segment: &str) -> Result<Vec<u8>, TokenError> {
    B64.decode(segment)
        .map_err(|e| TokenError::malformed(format!("{what}: {e}")))
}

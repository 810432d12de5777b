//! `RS256` compact JWS for refresh tokens.
//!
//! jsonwebtoken checks the signature and that `exp` is present; the expiry
//! comparison itself runs against the injected clock so tests can move time.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;

use crate::claims::RefreshClaims;
use crate::errors::TokenError;

/// # Errors
/// `Crypto` if signing fails.
pub fn sign(claims: &RefreshClaims, key: &EncodingKey) -> Result<String, TokenError> {
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, key)
        .map_err(|e| TokenError::crypto(format!("refresh token signing: {e}")))
}

/// Verify signature, structure and expiry.
///
/// # Errors
/// - `InvalidSignature` when the signature does not verify under `key`.
/// - `Expired` when `now` is past `exp`.
/// - `Malformed` for anything else (bad encoding, wrong algorithm, missing claims).
pub fn verify(
    token: &str,
    key: &DecodingKey,
    now: OffsetDateTime,
) -> Result<RefreshClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp"]);

    let data = jsonwebtoken::decode::<RefreshClaims>(token, key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::malformed(e.to_string()),
        }
    })?;

    if now.unix_timestamp() > data.claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(data.claims)
}

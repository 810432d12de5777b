use crate::{claims::AccessClaims, errors::TokenError};

/// Verifies bearer access tokens presented on protected requests.
///
/// The auth middleware depends on this seam rather than on
/// [`TokenService`](crate::TokenService) so tests can swap in fakes.
pub trait AccessTokenVerifier: Send + Sync {
    /// Decrypt the token, check its integrity and expiry, and return its claims.
    ///
    /// # Errors
    /// `Malformed`, `InvalidSignature` or `Expired`.
    fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError>;
}

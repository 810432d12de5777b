use std::sync::Arc;

use crm_security::{LookupError, UserLookup};
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument, warn};

use crate::claims::{AccessClaims, RefreshClaims, TokenPair, TokenSubject};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::errors::TokenError;
use crate::keys::{AccessKeys, RefreshKeys};
use crate::traits::AccessTokenVerifier;
use crate::{jwe, refresh};

/// Issues and verifies access and refresh tokens.
///
/// Key material is parsed once in [`TokenService::from_config`]; after that
/// the service is immutable and cheap to share behind an `Arc`.
pub struct TokenService {
    access: AccessKeys,
    refresh: RefreshKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// # Errors
    /// `Crypto` if any key is missing, unreadable, unparseable or mismatched.
    pub fn from_config(cfg: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        let access = AccessKeys::from_pem("access_key", &cfg.access_key.resolve("access_key")?)?;
        let refresh =
            RefreshKeys::from_pem("refresh_key", &cfg.refresh_key.resolve("refresh_key")?)?;
        Ok(Self {
            access,
            refresh,
            access_ttl: ttl(cfg.access_token_ttl_secs),
            refresh_ttl: ttl(cfg.refresh_token_ttl_secs),
            clock,
        })
    }

    /// Encrypt a fresh access token for `subject`, valid for the access TTL.
    ///
    /// # Errors
    /// `Crypto` if encryption fails.
    pub fn create_access_token(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = AccessClaims {
            subject: subject.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.access_ttl).unix_timestamp(),
        };
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| TokenError::crypto(format!("access claims: {e}")))?;
        jwe::encrypt(&payload, &self.access.encrypt)
    }

    /// Sign a refresh token carrying only `user_id`.
    ///
    /// # Errors
    /// `Crypto` if signing fails.
    pub fn create_refresh_token(&self, user_id: i32) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = RefreshClaims {
            user_id,
            iat: now.unix_timestamp(),
            exp: (now + self.refresh_ttl).unix_timestamp(),
        };
        refresh::sign(&claims, &self.refresh.sign)
    }

    /// Both tokens for a successful login.
    ///
    /// # Errors
    /// `Crypto` if either token cannot be produced.
    pub fn issue_pair(&self, subject: &TokenSubject) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.create_access_token(subject)?,
            refresh_token: self.create_refresh_token(subject.user_id)?,
        })
    }

    /// # Errors
    /// `Malformed`, `InvalidSignature` or `Expired`.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify_access_token(token, &self.access, self.clock.now())
    }

    /// # Errors
    /// `Malformed`, `InvalidSignature` or `Expired`.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        refresh::verify(token, &self.refresh.verify, self.clock.now())
    }

    /// Exchange a valid refresh token for a new access token.
    ///
    /// Claims are re-derived from the directory so role or name changes made
    /// since login take effect. The refresh token itself is returned as-is;
    /// its lifetime is bounded by the original login.
    ///
    /// # Errors
    /// - `Rejected` if the token does not verify or the user no longer exists.
    /// - `Directory` if the user lookup fails for another reason.
    /// - `Crypto` if the new access token cannot be produced.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        users: &dyn UserLookup,
    ) -> Result<TokenPair, TokenError> {
        let claims = self.verify_refresh(refresh_token).map_err(|e| {
            debug!(reason = %e, "refresh token rejected");
            TokenError::Rejected(e.to_string())
        })?;

        let user = users.get_user(claims.user_id).await.map_err(|e| match e {
            LookupError::NotFound { .. } => {
                debug!(user_id = claims.user_id, "refresh for unknown user");
                TokenError::Rejected(e.to_string())
            }
            LookupError::Storage(msg) => {
                warn!(user_id = claims.user_id, error = %msg, "user lookup failed during refresh");
                TokenError::Directory(msg)
            }
        })?;

        if !user.is_enabled {
            debug!(user_id = user.user_id, "refresh for disabled user");
            return Err(TokenError::Rejected("user is disabled".to_owned()));
        }

        let subject = TokenSubject {
            user_id: user.user_id,
            company_id: user.company_id,
            role_id: user.role_id,
            name: user.name,
        };
        Ok(TokenPair {
            access_token: self.create_access_token(&subject)?,
            refresh_token: refresh_token.to_owned(),
        })
    }
}

impl AccessTokenVerifier for TokenService {
    fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        TokenService::verify_access(self, token)
    }
}

fn verify_access_token(
    token: &str,
    keys: &AccessKeys,
    now: OffsetDateTime,
) -> Result<AccessClaims, TokenError> {
    let payload = jwe::decrypt(token, &keys.decrypt)?;
    let claims: AccessClaims = serde_json::from_slice(&payload)
        .map_err(|e| TokenError::malformed(format!("access claims: {e}")))?;
    if now.unix_timestamp() > claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

fn ttl(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// Token failures.
///
/// Callers facing the network collapse every variant except `Crypto` and
/// `Directory` into a single generic "unauthenticated" answer; the variant is
/// kept for logs and tests only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Token malformed: {0}")]
    Malformed(String),

    #[error("Token signature or ciphertext is invalid")]
    InvalidSignature,

    /// Key material missing/unparseable or a primitive failed while issuing.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Refresh refused: token did not verify or the user is gone.
    #[error("Token rejected: {0}")]
    Rejected(String),

    /// Refresh could not reach the user directory.
    #[error("User directory unavailable: {0}")]
    Directory(String),
}

impl TokenError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub(crate) fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    /// `true` for failures caused by the presented token rather than by the
    /// server's own configuration or storage.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::Malformed(_) | Self::InvalidSignature | Self::Rejected(_)
        )
    }
}

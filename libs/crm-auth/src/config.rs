//! Token service configuration.
//!
//! Key material is supplied out of band, either inline (PEM text, typically
//! from an environment variable) or as a path to a PEM file. Nothing is
//! compiled in.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::errors::TokenError;

pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 8 * 60 * 60;

/// Token service configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// RSA pair used to encrypt (public) and decrypt (private) access tokens.
    pub access_key: KeyPairConfig,

    /// RSA pair used to sign (private) and verify (public) refresh tokens.
    pub refresh_key: KeyPairConfig,

    pub access_token_ttl_secs: u64,

    pub refresh_token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_key: KeyPairConfig::default(),
            refresh_key: KeyPairConfig::default(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
        }
    }
}

/// One RSA key pair. For each half, inline PEM wins over the file path.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyPairConfig {
    pub private_key_pem: Option<SecretString>,
    pub private_key_file: Option<PathBuf>,
    pub public_key_pem: Option<String>,
    pub public_key_file: Option<PathBuf>,
}

/// PEM text resolved from a [`KeyPairConfig`].
pub struct KeyPairPem {
    pub private_pem: SecretString,
    pub public_pem: String,
}

impl KeyPairConfig {
    /// Inline PEM pair, mostly for tests and env-injected secrets.
    #[must_use]
    pub fn inline(private_pem: &str, public_pem: &str) -> Self {
        Self {
            private_key_pem: Some(SecretString::from(private_pem.to_owned())),
            private_key_file: None,
            public_key_pem: Some(public_pem.to_owned()),
            public_key_file: None,
        }
    }

    /// Resolve both halves to PEM text.
    ///
    /// # Errors
    /// `Crypto` when a half is not configured or its file cannot be read.
    pub fn resolve(&self, label: &str) -> Result<KeyPairPem, TokenError> {
        let private_pem = match (&self.private_key_pem, &self.private_key_file) {
            (Some(pem), _) => SecretString::from(pem.expose_secret().to_owned()),
            (None, Some(path)) => SecretString::from(read_pem(label, path)?),
            (None, None) => {
                return Err(TokenError::crypto(format!(
                    "{label}: private key is not configured"
                )));
            }
        };

        let public_pem = match (&self.public_key_pem, &self.public_key_file) {
            (Some(pem), _) => pem.clone(),
            (None, Some(path)) => read_pem(label, path)?,
            (None, None) => {
                return Err(TokenError::crypto(format!(
                    "{label}: public key is not configured"
                )));
            }
        };

        Ok(KeyPairPem {
            private_pem,
            public_pem,
        })
    }
}

fn read_pem(label: &str, path: &Path) -> Result<String, TokenError> {
    std::fs::read_to_string(path).map_err(|e| {
        TokenError::crypto(format!("{label}: cannot read {}: {e}", path.display()))
    })
}

//! `POST /login` and `POST /refresh`.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use crm_auth::{TokenError, TokenPair, TokenSubject};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::router::GatewayState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub company_id: i32,
    pub user_name: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<GatewayState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(req) = payload?;

    let user = state
        .credentials
        .verify_credentials(req.company_id, &req.user_name, req.password.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "credential check failed");
            ApiError::Internal
        })?
        .ok_or_else(|| {
            tracing::debug!(
                reason = "invalid_credentials",
                company_id = req.company_id,
                "login rejected"
            );
            ApiError::Unauthenticated
        })?;

    let subject = TokenSubject {
        user_id: user.user_id,
        company_id: user.company_id,
        role_id: user.role_id,
        name: user.name,
    };
    let pair = state.tokens.issue_pair(&subject).map_err(token_error)?;
    tracing::info!(user_id = subject.user_id, "login succeeded");
    Ok(Json(pair))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<GatewayState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(req) = payload?;
    let pair = state
        .tokens
        .refresh(&req.refresh_token, state.users.as_ref())
        .await
        .map_err(token_error)?;
    Ok(Json(pair))
}

fn token_error(err: TokenError) -> ApiError {
    if err.is_client_error() {
        tracing::debug!(reason = "invalid_token", error = %err, "token request rejected");
        ApiError::Unauthenticated
    } else {
        tracing::error!(error = %err, "token service failure");
        ApiError::Internal
    }
}

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use crm_auth::{AccessClaims, AccessTokenVerifier, TokenError};
use crm_security::{RoleLookup, RoleRecord, SecurityContext};
use http::{HeaderMap, Method, header};
use policy_engine::PolicyEngine;

use crate::error::ApiError;

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn AccessTokenVerifier>,
    pub roles: Arc<dyn RoleLookup>,
    pub engine: Arc<PolicyEngine>,
}

/// Why a request was turned away. Logged as the `reason` field; the client
/// only sees the generic [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingToken,
    InvalidToken,
    RoleUnavailable,
    RoleDisabled,
    RoleCompanyMismatch,
    PolicyDenied,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::RoleUnavailable => "role_unavailable",
            Self::RoleDisabled => "role_disabled",
            Self::RoleCompanyMismatch => "role_company_mismatch",
            Self::PolicyDenied => "policy_denied",
        }
    }

    fn into_error(self) -> ApiError {
        match self {
            Self::MissingToken | Self::InvalidToken => ApiError::Unauthenticated,
            Self::RoleUnavailable => ApiError::Internal,
            Self::RoleDisabled | Self::RoleCompanyMismatch | Self::PolicyDenied => {
                ApiError::Forbidden
            }
        }
    }
}

/// Authentication and authorization for protected routes.
///
/// For each request:
/// 1. Skips CORS preflight requests
/// 2. Extracts the access token from `Authorization`
/// 3. Decrypts and verifies it
/// 4. Loads the caller's role
/// 5. Enforces `(role name, path, method)` against the policy engine
/// 6. Inserts the caller's `SecurityContext` and continues
///
/// Each step either passes or ends the request; nothing is retried.
pub async fn authn_middleware(
    State(state): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if is_preflight_request(req.method(), req.headers()) {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    match authorize(&state, &parts.method, parts.uri.path(), &parts.headers).await {
        Ok(ctx) => {
            parts.extensions.insert(ctx);
            next.run(http::Request::from_parts(parts, body)).await
        }
        Err(rejection) => rejection.into_error().into_response(),
    }
}

async fn authorize(
    state: &AuthState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Result<SecurityContext, Rejection> {
    let method = method.as_str();

    let Some(token) = extract_bearer_token(headers) else {
        return Err(reject(Rejection::MissingToken, method, path));
    };

    let claims = state.verifier.verify_access(token).map_err(|e| {
        log_token_error(&e);
        reject(Rejection::InvalidToken, method, path)
    })?;

    let role = state
        .roles
        .get_role(claims.subject.role_id)
        .await
        .map_err(|e| {
            tracing::error!(
                reason = Rejection::RoleUnavailable.as_str(),
                role_id = claims.subject.role_id,
                error = %e,
                "role lookup failed"
            );
            Rejection::RoleUnavailable
        })?;

    check_role(&claims, &role).map_err(|r| reject(r, method, path))?;

    if !state.engine.enforce(&role.name, path, method) {
        tracing::debug!(role = %role.name, "no policy allows this request");
        return Err(reject(Rejection::PolicyDenied, method, path));
    }

    Ok(SecurityContext::new(
        claims.subject.user_id,
        claims.subject.company_id,
        claims.subject.role_id,
    ))
}

fn check_role(claims: &AccessClaims, role: &RoleRecord) -> Result<(), Rejection> {
    if !role.is_enabled {
        return Err(Rejection::RoleDisabled);
    }
    if role.company_id != claims.subject.company_id {
        return Err(Rejection::RoleCompanyMismatch);
    }
    Ok(())
}

fn reject(rejection: Rejection, method: &str, path: &str) -> Rejection {
    tracing::debug!(reason = rejection.as_str(), %method, %path, "request rejected");
    rejection
}

fn log_token_error(err: &TokenError) {
    if err.is_client_error() {
        tracing::debug!(error = %err, "access token did not verify");
    } else {
        tracing::error!(error = %err, "access token verification failed on the server side");
    }
}

/// Access token from `Authorization`, with or without a `Bearer` scheme.
/// The scheme is case-insensitive; a bare scheme carries no token.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("Bearer") => rest.trim(),
        _ if value.eq_ignore_ascii_case("Bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Check if this is a CORS preflight request
///
/// Preflight requests are OPTIONS requests with:
/// - Origin header present
/// - Access-Control-Request-Method header present
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

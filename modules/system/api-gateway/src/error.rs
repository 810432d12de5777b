use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use crm_db::DbError;
use http::StatusCode;
use policy_engine::PolicyError;
use serde::Serialize;

/// Every error a client can see. The body is `{"code": ..., "message": ...}`
/// with a stable `code`; internal causes are logged where the error is
/// converted and never put in the body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("access denied")]
    Forbidden,

    #[error("{0}")]
    PolicyConflict(String),

    #[error("{0}")]
    PolicyNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("transaction failed")]
    TransactionFailure,

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PolicyConflict(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PolicyNotFound(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TransactionFailure | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::PolicyConflict(_) => "policy_conflict",
            Self::PolicyNotFound(_) => "policy_not_found",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::TransactionFailure => "transaction_failure",
            Self::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let body = ErrorBody {
            code: self.code(),
            message: &message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::InvalidPattern { .. } => Self::BadRequest(err.to_string()),
            PolicyError::AlreadyExists(_) => Self::PolicyConflict(err.to_string()),
            PolicyError::NotFound(_) => Self::PolicyNotFound(err.to_string()),
            PolicyError::Transaction(e) => e.into(),
            PolicyError::Store(msg) => {
                tracing::error!(error = %msg, "policy store failure");
                Self::Internal
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_transaction_failure() {
            tracing::error!(error = %err, "transaction failure");
            Self::TransactionFailure
        } else {
            tracing::error!(error = %err, "database failure");
            Self::Internal
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use http_body_util::BodyExt;
    use policy_engine::PolicyRule;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn auth_errors_have_generic_bodies() {
        let (status, body) = body_json(ApiError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            serde_json::json!({"code": "unauthenticated", "message": "authentication required"})
        );

        let (status, body) = body_json(ApiError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "forbidden");
    }

    #[tokio::test]
    async fn server_faults_hide_the_cause() {
        let err: ApiError = PolicyError::Store("password=hunter2 in DSN".to_owned()).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "internal_error");
        assert!(!body.to_string().contains("hunter2"));
    }

    #[test]
    fn policy_errors_map_to_client_codes() {
        let rule = PolicyRule::new("admin", "/x", "GET");
        let conflict: ApiError = PolicyError::AlreadyExists(rule.clone()).into();
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);
        assert_eq!(conflict.code(), "policy_conflict");

        let missing: ApiError = PolicyError::NotFound(rule).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), "policy_not_found");

        let invalid: ApiError = PolicyError::InvalidPattern {
            pattern: "(".to_owned(),
            reason: "unclosed group".to_owned(),
        }
        .into();
        assert_eq!(invalid.code(), "bad_request");
    }

    #[test]
    fn closed_transaction_is_a_transaction_failure() {
        let err: ApiError =
            PolicyError::Transaction(DbError::Closed(crm_db::TxStatus::RolledBack)).into();
        assert_eq!(err.code(), "transaction_failure");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

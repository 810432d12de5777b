//! `GET`, `POST` and `DELETE /policies`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use crm_db::TxHandle;
use http::StatusCode;
use policy_engine::PolicyRule;

use crate::error::ApiError;
use crate::router::GatewayState;

pub async fn list_policies(State(state): State<GatewayState>) -> Json<Vec<PolicyRule>> {
    Json(state.policies.list())
}

/// `400 policy_conflict` if the rule already exists.
pub async fn add_policy(
    State(state): State<GatewayState>,
    Extension(tx): Extension<Arc<TxHandle>>,
    payload: Result<Json<PolicyRule>, JsonRejection>,
) -> Result<(StatusCode, Json<PolicyRule>), ApiError> {
    let Json(rule) = payload?;
    state.policies.add(&tx, rule.clone()).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// `404 policy_not_found` if no identical rule exists.
pub async fn remove_policy(
    State(state): State<GatewayState>,
    Extension(tx): Extension<Arc<TxHandle>>,
    payload: Result<Json<PolicyRule>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(rule) = payload?;
    state.policies.remove(&tx, rule).await?;
    Ok(StatusCode::NO_CONTENT)
}

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use crm_auth::TokenService;
use crm_db::TransactionScope;
use crm_security::{CredentialVerifier, RoleLookup, UserLookup};
use policy_engine::PolicyAdmin;

use crate::auth::{AuthState, authn_middleware};
use crate::handlers::{policies, session};
use crate::transaction::transaction_middleware;

/// Everything the gateway's own handlers and middleware need.
#[derive(Clone)]
pub struct GatewayState {
    pub tokens: Arc<TokenService>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub users: Arc<dyn UserLookup>,
    pub roles: Arc<dyn RoleLookup>,
    pub policies: Arc<PolicyAdmin>,
    pub transactions: TransactionScope,
}

impl GatewayState {
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            verifier: self.tokens.clone(),
            roles: self.roles.clone(),
            engine: self.policies.engine().clone(),
        }
    }
}

/// Assemble the application router.
///
/// `protected` carries the business routes, already bound to their own
/// state. They and `/policies` run behind authentication and the
/// transaction scope; `/login` and `/refresh` are public.
pub fn build_router(state: GatewayState, protected: Router) -> Router {
    let guarded = Router::new()
        .route(
            "/policies",
            get(policies::list_policies)
                .post(policies::add_policy)
                .delete(policies::remove_policy),
        )
        .with_state(state.clone())
        .merge(protected)
        .layer(from_fn_with_state(
            state.transactions.clone(),
            transaction_middleware,
        ))
        .layer(from_fn_with_state(state.auth_state(), authn_middleware));

    Router::new()
        .route("/login", post(session::login))
        .route("/refresh", post(session::refresh))
        .with_state(state)
        .merge(guarded)
}

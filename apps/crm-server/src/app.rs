use std::sync::Arc;

use anyhow::Context;
use api_gateway::{ApiGatewayConfig, GatewayState, build_router};
use axum::Router;
use crm_auth::{Clock, TokenService};
use crm_db::TransactionScope;
use crm_db::sea_orm::DatabaseConnection;
use http::{HeaderName, StatusCode};
use identity::IdentityService;
use policy_engine::{PolicyAdmin, build_store, load_engine};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::orders;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assemble the full application over an already migrated database.
///
/// # Errors
/// Fails when key material does not load (refuses startup) or the
/// configured policy store cannot be read.
pub async fn build_app(
    cfg: &AppConfig,
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Router> {
    let tokens = TokenService::from_config(&cfg.auth, clock).context("loading token keys")?;

    let store = build_store(&cfg.policy, &db).context("selecting policy store")?;
    let engine = load_engine(store.as_ref())
        .await
        .context("loading policy rules")?;

    let identity = Arc::new(IdentityService::new(db.clone()));
    let state = GatewayState {
        tokens: Arc::new(tokens),
        credentials: identity.clone(),
        users: identity.clone(),
        roles: identity,
        policies: Arc::new(PolicyAdmin::new(Arc::new(engine), store)),
        transactions: TransactionScope::new(db),
    };

    let router = build_router(state, orders::router());
    Ok(with_http_layers(router, &cfg.server))
}

/// Request id, request span and timeout around every route. A timed-out
/// request is dropped mid-flight, which rolls back its transaction.
fn with_http_layers(router: Router, cfg: &ApiGatewayConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                cfg.request_timeout(),
            )),
    )
}

/// Serve until Ctrl-C.
///
/// # Errors
/// Fails if the listener cannot bind or the server stops with an I/O error.
pub async fn serve(router: Router, cfg: &ApiGatewayConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    info!(addr = %cfg.bind_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

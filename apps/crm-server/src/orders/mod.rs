//! `/crm/v1.0/orders`: the reference business resource.
//!
//! Every handler runs behind the auth and transaction middleware, reads the
//! caller from `Extension<SecurityContext>` and writes through
//! `Extension<Arc<TxHandle>>`. Mutations record their field diff with the
//! [`AuditTrailRecorder`](audit_trail::AuditTrailRecorder) on the same
//! transaction and commit last.

pub mod dto;
pub mod entity;
mod handlers;
pub mod migration;

use audit_trail::AuditTrailRecorder;
use axum::Router;
use axum::routing::get;

pub const ORDERS_PATH: &str = "/crm/v1.0/orders";

#[must_use]
pub fn router() -> Router {
    Router::new()
        .route(ORDERS_PATH, get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/crm/v1.0/orders/{id}",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/crm/v1.0/orders/{id}/history", get(handlers::order_history))
        .with_state(AuditTrailRecorder::new())
}

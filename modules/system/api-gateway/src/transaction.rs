use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use crm_db::{TransactionScope, TxHandle};

use crate::error::ApiError;

/// Opens the request's transaction and guarantees it ends.
///
/// The handler receives the handle as `Extension<Arc<TxHandle>>` and calls
/// `commit()` once its writes (and their audit entries) are done. Whatever
/// happens in the handler, `rollback()` runs afterwards and is a no-op if the
/// handler committed. If the request future is dropped instead (timeout,
/// client gone), dropping the handle rolls back.
pub async fn transaction_middleware(
    State(scope): State<TransactionScope>,
    mut req: Request,
    next: Next,
) -> Response {
    let tx: Arc<TxHandle> = match scope.open().await {
        Ok(tx) => tx,
        Err(e) => return ApiError::from(e).into_response(),
    };

    req.extensions_mut().insert(Arc::clone(&tx));
    let response = next.run(req).await;

    tx.rollback().await;
    response
}

use std::sync::Arc;

use api_gateway::ApiError;
use audit_trail::{AuditError, AuditTrailRecorder, Audited, ChangeSet, HistoricalRecord, diff};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use crm_db::{DbError, TxHandle};
use crm_security::SecurityContext;
use http::StatusCode;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};
use tracing::{error, info, instrument};

use super::dto::{DEFAULT_STATUS, NewOrder, OrderDto, OrderPatch, check_amount, check_status};
use super::entity;

pub async fn list_orders(
    Extension(ctx): Extension<SecurityContext>,
    Extension(tx): Extension<Arc<TxHandle>>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let conn = tx.conn().await?;
    let orders = entity::Entity::find()
        .filter(entity::Column::CompanyId.eq(ctx.company_id()))
        .order_by_asc(entity::Column::Id)
        .all(&*conn)
        .await
        .map_err(DbError::from)?;
    Ok(Json(orders.into_iter().map(OrderDto::from).collect()))
}

pub async fn get_order(
    Extension(ctx): Extension<SecurityContext>,
    Extension(tx): Extension<Arc<TxHandle>>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDto>, ApiError> {
    let conn = tx.conn().await?;
    let order = find_order(&*conn, &ctx, id).await?;
    Ok(Json(order.into()))
}

#[instrument(skip_all, fields(user_id = ctx.user_id()))]
pub async fn create_order(
    State(recorder): State<AuditTrailRecorder>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(tx): Extension<Arc<TxHandle>>,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderDto>), ApiError> {
    let Json(new) = payload?;
    let status = new.status.unwrap_or_else(|| DEFAULT_STATUS.to_owned());
    check_status(&status).map_err(ApiError::BadRequest)?;
    check_amount(new.amount).map_err(ApiError::BadRequest)?;

    let conn = tx.conn().await?;
    let order = entity::ActiveModel {
        id: NotSet,
        company_id: Set(ctx.company_id()),
        status: Set(status),
        description: Set(new.description),
        amount: Set(new.amount),
        created_by: Set(ctx.user_id()),
    }
    .insert(&*conn)
    .await
    .map_err(DbError::from)?;

    record_history(&recorder, &conn, diff(None, Some(&order)), &ctx).await?;
    drop(conn);
    tx.commit().await?;

    info!(order_id = order.id, "order created");
    Ok((StatusCode::CREATED, Json(order.into())))
}

#[instrument(skip_all, fields(order_id = id, user_id = ctx.user_id()))]
pub async fn update_order(
    State(recorder): State<AuditTrailRecorder>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(tx): Extension<Arc<TxHandle>>,
    Path(id): Path<i32>,
    payload: Result<Json<OrderPatch>, JsonRejection>,
) -> Result<Json<OrderDto>, ApiError> {
    let Json(patch) = payload?;
    if let Some(status) = &patch.status {
        check_status(status).map_err(ApiError::BadRequest)?;
    }
    if let Some(amount) = patch.amount {
        check_amount(amount).map_err(ApiError::BadRequest)?;
    }

    let conn = tx.conn().await?;
    let before = find_order(&*conn, &ctx, id).await?;

    let mut active = before.clone().into_active_model();
    if let Some(status) = patch.status {
        active.status = Set(status);
    }
    if let Some(description) = patch.description {
        active.description = Set(Some(description));
    }
    if let Some(amount) = patch.amount {
        active.amount = Set(amount);
    }
    if !active.is_changed() {
        return Ok(Json(before.into()));
    }

    let after = active.update(&*conn).await.map_err(DbError::from)?;
    record_history(&recorder, &conn, diff(Some(&before), Some(&after)), &ctx).await?;
    drop(conn);
    tx.commit().await?;

    Ok(Json(after.into()))
}

#[instrument(skip_all, fields(order_id = id, user_id = ctx.user_id()))]
pub async fn delete_order(
    State(recorder): State<AuditTrailRecorder>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(tx): Extension<Arc<TxHandle>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let conn = tx.conn().await?;
    let before = find_order(&*conn, &ctx, id).await?;

    entity::Entity::delete_by_id(before.id)
        .exec(&*conn)
        .await
        .map_err(DbError::from)?;
    record_history(&recorder, &conn, diff(Some(&before), None), &ctx).await?;
    drop(conn);
    tx.commit().await?;

    info!("order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Field history of a live order, oldest entry first.
pub async fn order_history(
    State(recorder): State<AuditTrailRecorder>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(tx): Extension<Arc<TxHandle>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<HistoricalRecord>>, ApiError> {
    let conn = tx.conn().await?;
    let order = find_order(&*conn, &ctx, id).await?;
    let history = recorder
        .history(&*conn, entity::Model::SOURCE_TYPE, order.id)
        .await
        .map_err(audit_failure)?;
    Ok(Json(history))
}

/// Orders of other companies are reported as absent.
async fn find_order(
    conn: &impl ConnectionTrait,
    ctx: &SecurityContext,
    id: i32,
) -> Result<entity::Model, ApiError> {
    entity::Entity::find_by_id(id)
        .filter(entity::Column::CompanyId.eq(ctx.company_id()))
        .one(conn)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))
}

async fn record_history(
    recorder: &AuditTrailRecorder,
    tx: &DatabaseTransaction,
    changes: Option<ChangeSet>,
    ctx: &SecurityContext,
) -> Result<(), ApiError> {
    if let Some(changes) = changes {
        recorder
            .record(tx, &changes, ctx.user_id())
            .await
            .map_err(audit_failure)?;
    }
    Ok(())
}

fn audit_failure(err: AuditError) -> ApiError {
    error!(error = %err, "order history failed");
    ApiError::Internal
}

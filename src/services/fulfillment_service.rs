//! Delivery of purchased stock units.
//!
//! A delivery attempt claims every unit an order needs inside one transaction.
//! Either all line items are claimed and the order becomes DELIVERED, or the
//! transaction rolls back and a separate write marks the attempt FAILED.
//! Retrying is simply calling [`deliver_order`] again.

use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    activity::NewActivity,
    db::with_timeout,
    dto::orders::DeliveryOutcome,
    entity::{
        delivery_logs::ActiveModel as DeliveryLogActive,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        stock::Model as StockModel,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    mailer::{DeliveredLine, OrderDeliveredEmail},
    middleware::auth::{AuthUser, ensure_active},
    models::{DeliveryLogStatus, DeliveryStatus, OrderStatus, parse_status},
    response::{ApiResponse, Meta},
    services::inventory_service,
    state::AppState,
    unit_of_work::{Committed, PostCommit, UnitOfWork},
};

pub const DELIVERED_MESSAGE: &str = "Order delivered successfully";

/// Delivery endpoint: only an admin or the order's owner may trigger it.
pub async fn deliver(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<DeliveryOutcome>> {
    ensure_active(user)?;
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !user.is_admin() && order.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let outcome = deliver_order(state, order_id).await?;
    Ok(ApiResponse::success(
        outcome.message.clone(),
        outcome,
        Some(Meta::empty()),
    ))
}

/// Runs one delivery attempt for a completed order.
///
/// Precondition failures (missing order, order not completed, already
/// delivered) leave no trace. Any other failure is recorded as a FAILED
/// attempt before being returned.
pub async fn deliver_order(state: &AppState, order_id: Uuid) -> AppResult<DeliveryOutcome> {
    let attempt = with_timeout(state.tx_timeout, claim_and_deliver(state, order_id)).await;

    match attempt {
        Ok((first_stock_id, committed)) => {
            tracing::info!(%order_id, %first_stock_id, "order delivered");
            // The delivery is durable; notification runs outside the attempt's timeout.
            committed.run_hooks(state).await;
            Ok(DeliveryOutcome {
                success: true,
                message: DELIVERED_MESSAGE.to_string(),
            })
        }
        Err(err @ (AppError::NotFound | AppError::OrderNotCompleted | AppError::AlreadyDelivered)) => {
            Err(err)
        }
        Err(err) => {
            tracing::warn!(%order_id, error = %err, "delivery failed");
            if let Err(record_err) = record_failure(state, order_id, &err).await {
                tracing::error!(%order_id, error = %record_err, "failed to record delivery failure");
            }
            Err(err)
        }
    }
}

async fn claim_and_deliver(state: &AppState, order_id: Uuid) -> AppResult<(Uuid, Committed)> {
    let mut uow = UnitOfWork::begin(&state.orm).await?;

    // The row lock serializes concurrent attempts on the same order.
    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(uow.conn())
        .await?
        .ok_or(AppError::NotFound)?;

    if parse_status::<OrderStatus>(&order.status)? != OrderStatus::Completed {
        return Err(AppError::OrderNotCompleted);
    }
    if parse_status::<DeliveryStatus>(&order.delivery_status)? == DeliveryStatus::Delivered {
        return Err(AppError::AlreadyDelivered);
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(uow.conn())
        .await?;
    if items.is_empty() {
        return Err(AppError::Validation("Order has no items".into()));
    }

    let mut claimed: Vec<StockModel> = Vec::new();
    for item in &items {
        let quantity = u64::try_from(item.quantity)
            .map_err(|_| AppError::Validation("Order item has invalid quantity".into()))?;
        let units =
            inventory_service::claim_units(uow.conn(), item.product_id, quantity, order.id).await?;
        claimed.extend(units);
    }
    let first_stock_id = claimed
        .first()
        .map(|unit| unit.id)
        .ok_or_else(|| AppError::Validation("Order has no items".into()))?;

    Orders::update_many()
        .col_expr(OrderCol::DeliveryStatus, Expr::value(DeliveryStatus::Delivered.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(OrderCol::Id.eq(order.id))
        .exec(uow.conn())
        .await?;

    insert_delivery_log(
        uow.conn(),
        order.id,
        first_stock_id.to_string(),
        DeliveryLogStatus::Success,
        DELIVERED_MESSAGE.to_string(),
    )
    .await?;

    let email = build_delivered_email(uow.conn(), order.user_id, order.id, &claimed).await?;
    if let Some(email) = email {
        uow.after_commit(PostCommit::OrderDelivered(email));
    }
    uow.after_commit(PostCommit::Activity(NewActivity::new(
        "order_delivered",
        format!("Order {} delivered ({} units)", order.id, claimed.len()),
        Some(order.user_id),
    )));

    let committed = uow.commit().await?;
    Ok((first_stock_id, committed))
}

/// Marks the order FAILED and appends the failure to its delivery log.
async fn record_failure(state: &AppState, order_id: Uuid, cause: &AppError) -> AppResult<()> {
    let mut uow = UnitOfWork::begin(&state.orm).await?;

    // Never downgrade an order that a concurrent attempt already delivered.
    let updated = Orders::update_many()
        .col_expr(OrderCol::DeliveryStatus, Expr::value(DeliveryStatus::Failed.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::Status.eq(OrderStatus::Completed.as_str()))
        .filter(OrderCol::DeliveryStatus.ne(DeliveryStatus::Delivered.as_str()))
        .exec(uow.conn())
        .await?;
    if updated.rows_affected == 0 {
        return Ok(());
    }

    insert_delivery_log(
        uow.conn(),
        order_id,
        String::new(),
        DeliveryLogStatus::Failed,
        cause.to_string(),
    )
    .await?;

    uow.after_commit(PostCommit::Activity(NewActivity::new(
        "order_delivery_failed",
        format!("Delivery of order {order_id} failed: {cause}"),
        None,
    )));
    uow.commit().await?.run_hooks(state).await;
    Ok(())
}

async fn insert_delivery_log<C>(
    conn: &C,
    order_id: Uuid,
    stock_id: String,
    status: DeliveryLogStatus,
    message: String,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    DeliveryLogActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        stock_id: Set(stock_id),
        status: Set(status.to_string()),
        message: Set(message),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn build_delivered_email<C>(
    conn: &C,
    user_id: Uuid,
    order_id: Uuid,
    claimed: &[StockModel],
) -> AppResult<Option<OrderDeliveredEmail>>
where
    C: ConnectionTrait,
{
    let Some(buyer) = Users::find_by_id(user_id).one(conn).await? else {
        return Ok(None);
    };

    let product_ids: Vec<Uuid> = claimed.iter().map(|unit| unit.product_id).collect();
    let names: HashMap<Uuid, String> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let mut products: Vec<String> = Vec::new();
    let stock_items = claimed
        .iter()
        .map(|unit| {
            let product_name = names.get(&unit.product_id).cloned().unwrap_or_default();
            if !products.contains(&product_name) {
                products.push(product_name.clone());
            }
            DeliveredLine {
                product_name,
                content: unit.content.clone(),
            }
        })
        .collect();

    Ok(Some(OrderDeliveredEmail {
        to: buyer.email,
        name: buyer.name,
        order_id,
        products,
        stock_items,
    }))
}

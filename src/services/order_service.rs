use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    activity::NewActivity,
    db::with_timeout,
    dto::orders::{CheckoutItem, CheckoutRequest, CheckoutResponse, DeliveryOutcome, OrderList, OrderWithItems},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        stock::{Column as StockCol, Entity as Stock},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_active},
    models::{DeliveredItem, DeliveryStatus, Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{fulfillment_service, wallet_service},
    state::AppState,
    unit_of_work::{PostCommit, UnitOfWork},
};

/// A validated cart line priced from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Merges repeated products and rejects empty carts or non-positive quantities.
pub fn normalize_items(items: &[CheckoutItem]) -> AppResult<BTreeMap<Uuid, i32>> {
    if items.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }
    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::Validation("Cart has invalid quantity".into()));
        }
        let slot = merged.entry(item.product_id).or_insert(0);
        *slot = slot
            .checked_add(item.quantity)
            .ok_or_else(|| AppError::Validation("Cart has invalid quantity".into()))?;
    }
    Ok(merged)
}

/// Prices each line from current product data and checks the cached stock count.
///
/// The stock check is only a fast precheck; fulfillment decides authoritatively.
pub fn price_lines(
    wanted: &BTreeMap<Uuid, i32>,
    products: &[ProductModel],
) -> AppResult<(Vec<PricedLine>, Decimal)> {
    let mut lines = Vec::with_capacity(wanted.len());
    let mut total = Decimal::ZERO;
    for (product_id, quantity) in wanted {
        let product = products
            .iter()
            .find(|p| p.id == *product_id)
            .ok_or(AppError::NotFound)?;
        if product.stock_count < *quantity {
            return Err(AppError::InsufficientStock(*product_id));
        }
        total += product.price * Decimal::from(*quantity);
        lines.push(PricedLine {
            product_id: *product_id,
            quantity: *quantity,
            unit_price: product.price,
        });
    }
    Ok((lines, total))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Pays for the cart from the wallet and creates the order in one transaction,
/// then runs fulfillment for it.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    ensure_active(user)?;
    let wanted = normalize_items(&payload.items)?;

    let (order, items, committed) = with_timeout(state.tx_timeout, async {
        let mut uow = UnitOfWork::begin(&state.orm).await?;

        let products = Products::find()
            .filter(ProdCol::Id.is_in(wanted.keys().copied()))
            .all(uow.conn())
            .await?;
        let (lines, total_amount) = price_lines(&wanted, &products)?;

        if let Some(expected) = payload.total_amount {
            if expected != total_amount {
                return Err(AppError::Validation(format!(
                    "Prices changed, new total is {total_amount}"
                )));
            }
        }

        if total_amount > Decimal::ZERO {
            wallet_service::debit(uow.conn(), user.user_id, total_amount).await?;
        }

        // Payment settles from the balance above, so the order is born completed.
        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Completed.to_string()),
            delivery_status: Set(DeliveryStatus::Pending.to_string()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(uow.conn())
        .await?;

        let mut order_items: Vec<OrderItem> = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                price: Set(line.unit_price),
                created_at: NotSet,
            }
            .insert(uow.conn())
            .await?;
            order_items.push(OrderItem::from(item));
        }

        uow.after_commit(PostCommit::Activity(NewActivity::new(
            "order_created",
            format!("Order {} created for {}", order.id, total_amount),
            Some(user.user_id),
        )));
        let committed = uow.commit().await?;
        Ok((order, order_items, committed))
    })
    .await?;
    committed.run_hooks(state).await;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, total = %order.total_amount, "checkout completed");

    // The order is already paid; a failed delivery stays retryable through `deliver`.
    let delivery = match fulfillment_service::deliver_order(state, order.id).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(order_id = %order.id, error = %err, "delivery after checkout failed");
            DeliveryOutcome {
                success: false,
                message: err.to_string(),
            }
        }
    };

    let order = Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Checkout success",
        CheckoutResponse {
            order: Order::from(order),
            items,
            delivery,
        },
        Some(Meta::empty()),
    ))
}

/// Order detail for its owner or an admin, including delivered units.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.user_id != user.user_id && !user.is_admin() {
        // Other users' orders are indistinguishable from missing ones.
        return Err(AppError::NotFound);
    }

    let data = load_order_with_items(state, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn load_order_with_items(
    state: &AppState,
    order: crate::entity::orders::Model,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    let delivered = Stock::find()
        .filter(StockCol::OrderId.eq(order.id))
        .filter(StockCol::IsDelivered.eq(true))
        .order_by_asc(StockCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|unit| DeliveredItem {
            stock_id: unit.id,
            product_id: unit.product_id,
            content: unit.content,
        })
        .collect();

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
        delivered,
    })
}

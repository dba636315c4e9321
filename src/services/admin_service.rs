use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    activity::NewActivity,
    db::with_timeout,
    dto::{
        orders::{DeliveryLogList, OrderList, OrderWithItems},
        products::ProductList,
    },
    entity::{
        delivery_logs::{Column as DeliveryLogCol, Entity as DeliveryLogs},
        orders::{ActiveModel as OrderActive, Entity as Orders, Column as OrderCol},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_role},
    models::{DeliveryLog, Order, OrderStatus, Product, Role, parse_status},
    response::{ApiResponse, Meta},
    routes::admin::{LowStockQuery, UpdateOrderStatusRequest},
    routes::params::{OrderListQuery, SortOrder},
    services::order_service::load_order_with_items,
    state::AppState,
    unit_of_work::{PostCommit, UnitOfWork},
};

fn ensure_back_office(user: &AuthUser) -> AppResult<()> {
    ensure_role(user, &[Role::Admin, Role::Manager])
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_back_office(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
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

    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_back_office(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = load_order_with_items(state, order).await?;
    Ok(ApiResponse::success(
        "Order found",
        data,
        Some(Meta::empty()),
    ))
}

/// Moves an order along its status machine; terminal states are final.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = payload.status;

    let (order, committed) = with_timeout(state.tx_timeout, async {
        let mut uow = UnitOfWork::begin(&state.orm).await?;
        let existing = Orders::find_by_id(id)
            .lock(LockType::Update)
            .one(uow.conn())
            .await?
            .ok_or(AppError::NotFound)?;

        let current = parse_status::<OrderStatus>(&existing.status)?;
        if !current.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "Cannot move order from {current} to {next}"
            )));
        }

        let mut active: OrderActive = existing.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(chrono::Utc::now().into());
        let order = active.update(uow.conn()).await?;

        uow.after_commit(PostCommit::Activity(NewActivity::new(
            "order_status_update",
            format!("Order {} moved from {current} to {next}", order.id),
            Some(user.user_id),
        )));
        let committed = uow.commit().await?;
        Ok((order, committed))
    })
    .await?;
    committed.run_hooks(state).await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_delivery_logs(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<DeliveryLogList>> {
    ensure_back_office(user)?;
    let items = DeliveryLogs::find()
        .filter(DeliveryLogCol::OrderId.eq(order_id))
        .order_by_asc(DeliveryLogCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(DeliveryLog::from)
        .collect();

    Ok(ApiResponse::success(
        "Delivery logs",
        DeliveryLogList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_back_office(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let mut finder = Products::find().filter(ProdCol::StockCount.lte(threshold));
    finder = finder
        .order_by_asc(ProdCol::StockCount)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

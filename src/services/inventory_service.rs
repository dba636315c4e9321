use std::collections::HashSet;

use sea_orm::sea_query::{Expr, LockBehavior, LockType, OnConflict};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    activity::NewActivity,
    db::with_timeout,
    dto::stock::IngestResult,
    entity::{
        products::{Column as ProdCol, Entity as Products},
        stock::{ActiveModel as StockActive, Column as StockCol, Entity as Stock, Model as StockModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
    unit_of_work::{PostCommit, UnitOfWork},
};

// Postgres caps bind parameters at 65535 per statement.
const INSERT_CHUNK: usize = 1000;

/// Splits an uploaded stock file into one credential per line.
pub fn parse_stock_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Inserts each line of an uploaded stock file as an unclaimed unit,
/// skipping contents the product already has.
pub async fn ingest(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    text: &str,
) -> AppResult<ApiResponse<IngestResult>> {
    ensure_admin(user)?;
    let lines = parse_stock_lines(text);

    let (result, committed) = with_timeout(state.tx_timeout, async {
        let mut uow = UnitOfWork::begin(&state.orm).await?;
        let result = ingest_lines(uow.conn(), product_id, &lines).await?;
        uow.after_commit(PostCommit::Activity(NewActivity::new(
            "stock_upload",
            format!(
                "Uploaded stock for product {product_id}: {} added, {} duplicates",
                result.added, result.duplicates
            ),
            Some(user.user_id),
        )));
        let committed = uow.commit().await?;
        Ok((result, committed))
    })
    .await?;
    committed.run_hooks(state).await;

    tracing::info!(
        %product_id,
        added = result.added,
        duplicates = result.duplicates,
        "stock ingested"
    );

    Ok(ApiResponse::success(
        "Stock uploaded",
        result,
        Some(Meta::empty()),
    ))
}

/// Ingestion body, composable inside a caller's transaction.
pub async fn ingest_lines<C>(conn: &C, product_id: Uuid, lines: &[String]) -> AppResult<IngestResult>
where
    C: ConnectionTrait,
{
    let exists = Products::find_by_id(product_id).count(conn).await?;
    if exists == 0 {
        return Err(AppError::NotFound);
    }

    // Repeats inside one upload are duplicates too; the unique index
    // catches the ones already stored.
    let mut seen = HashSet::new();
    let fresh: Vec<&String> = lines.iter().filter(|l| seen.insert(l.as_str())).collect();

    let mut added: u64 = 0;
    for chunk in fresh.chunks(INSERT_CHUNK) {
        let rows = chunk.iter().map(|content| StockActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            content: Set((*content).clone()),
            is_delivered: Set(false),
            order_id: Set(None),
            created_at: NotSet,
        });
        added += Stock::insert_many(rows)
            .on_conflict(
                OnConflict::columns([StockCol::ProductId, StockCol::Content])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
    }

    let added = added as usize;
    if added > 0 {
        Products::update_many()
            .col_expr(
                ProdCol::StockCount,
                Expr::col(ProdCol::StockCount).add(added as i32),
            )
            .filter(ProdCol::Id.eq(product_id))
            .exec(conn)
            .await?;
    }

    Ok(IngestResult {
        added,
        duplicates: lines.len() - added,
    })
}

/// Claims `quantity` unclaimed units of a product for `order_id`.
///
/// Candidate rows are locked with `SKIP LOCKED` and then flipped by a guarded
/// update, so two concurrent claimants can never be granted the same unit.
/// When that comes up short, the lookup is repeated with a blocking lock so
/// units held by a claim that later rolls back are not reported missing.
/// Callers claiming several products must go in product id order.
/// Fails with [`AppError::InsufficientStock`] when fewer units are available;
/// the caller's transaction must then be rolled back.
pub async fn claim_units<C>(
    conn: &C,
    product_id: Uuid,
    quantity: u64,
    order_id: Uuid,
) -> AppResult<Vec<StockModel>>
where
    C: ConnectionTrait,
{
    if quantity == 0 {
        return Ok(Vec::new());
    }

    let mut candidates = lock_unclaimed(conn, product_id, quantity, Some(LockBehavior::SkipLocked)).await?;
    if (candidates.len() as u64) < quantity {
        // Units held by an in-flight claim were skipped; wait for it to commit
        // or roll back before deciding the product is short.
        candidates = lock_unclaimed(conn, product_id, quantity, None).await?;
    }

    if (candidates.len() as u64) < quantity {
        return Err(AppError::InsufficientStock(product_id));
    }

    let claimed = Stock::update_many()
        .col_expr(StockCol::IsDelivered, Expr::value(true))
        .col_expr(StockCol::OrderId, Expr::value(order_id))
        .filter(StockCol::Id.is_in(candidates.clone()))
        .filter(StockCol::IsDelivered.eq(false))
        .filter(StockCol::OrderId.is_null())
        .exec(conn)
        .await?;

    if claimed.rows_affected != quantity {
        return Err(AppError::InsufficientStock(product_id));
    }

    Products::update_many()
        .col_expr(
            ProdCol::StockCount,
            Expr::col(ProdCol::StockCount).sub(quantity as i32),
        )
        .filter(ProdCol::Id.eq(product_id))
        .exec(conn)
        .await?;

    let units = Stock::find()
        .filter(StockCol::Id.is_in(candidates))
        .order_by_asc(StockCol::CreatedAt)
        .all(conn)
        .await?;

    Ok(units)
}

async fn lock_unclaimed<C>(
    conn: &C,
    product_id: Uuid,
    quantity: u64,
    behavior: Option<LockBehavior>,
) -> AppResult<Vec<Uuid>>
where
    C: ConnectionTrait,
{
    let query = Stock::find()
        .select_only()
        .column(StockCol::Id)
        .filter(StockCol::ProductId.eq(product_id))
        .filter(StockCol::IsDelivered.eq(false))
        .filter(StockCol::OrderId.is_null())
        .order_by_asc(StockCol::CreatedAt)
        .limit(quantity);
    let query = match behavior {
        Some(behavior) => query.lock_with_behavior(LockType::Update, behavior),
        None => query.lock(LockType::Update),
    };
    Ok(query.into_tuple().all(conn).await?)
}

/// Number of units still available for a product.
pub async fn count_unclaimed<C>(conn: &C, product_id: Uuid) -> AppResult<u64>
where
    C: ConnectionTrait,
{
    let count = Stock::find()
        .filter(StockCol::ProductId.eq(product_id))
        .filter(StockCol::IsDelivered.eq(false))
        .filter(StockCol::OrderId.is_null())
        .count(conn)
        .await?;
    Ok(count)
}

/// Rewrites the cached `stock_count` from the stock table.
pub async fn reconcile_stock_count(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let (product, committed) = with_timeout(state.tx_timeout, async {
        let uow = UnitOfWork::begin(&state.orm).await?;
        let mut product = Products::find_by_id(product_id)
            .lock(LockType::Update)
            .one(uow.conn())
            .await?
            .ok_or(AppError::NotFound)?;

        let actual = count_unclaimed(uow.conn(), product_id).await? as i32;
        if product.stock_count != actual {
            tracing::info!(
                %product_id,
                cached = product.stock_count,
                actual,
                "stock count drift corrected"
            );
            Products::update_many()
                .col_expr(ProdCol::StockCount, Expr::value(actual))
                .filter(ProdCol::Id.eq(product_id))
                .exec(uow.conn())
                .await?;
            product.stock_count = actual;
        }
        let committed = uow.commit().await?;
        Ok((product, committed))
    })
    .await?;
    committed.run_hooks(state).await;

    Ok(ApiResponse::success(
        "Stock count reconciled",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_and_padding_are_dropped() {
        let lines = parse_stock_lines("  user1:pass1 \r\n\r\n\tuser2:pass2\n   \n");
        assert_eq!(lines, vec!["user1:pass1", "user2:pass2"]);
    }

    #[test]
    fn repeated_lines_are_kept_for_counting() {
        let lines = parse_stock_lines("abc\nabc\nxyz");
        assert_eq!(lines.len(), 3);
    }
}

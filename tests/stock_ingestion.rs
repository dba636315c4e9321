mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use vaultshop_api::{
    entity::products::{Column as ProdCol, Entity as Products},
    error::AppError,
    mailer::LogMailer,
    models::Role,
    routes::{admin::LowStockQuery, params::Pagination},
    services::{admin_service, inventory_service},
};

use common::{create_product, create_user, database_url, setup_state, stock_count, stock_file, stock_rows};

#[tokio::test]
async fn duplicate_lines_are_counted_and_skipped() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let admin = create_user(&state, Role::Admin, dec!(0)).await?;
    let product = create_product(&state, dec!(60.00)).await?;

    let result = inventory_service::ingest(&state, &admin, product, &stock_file(&["abc", "abc", "xyz"]))
        .await?
        .into_data()
        .expect("ingest result");
    assert_eq!(result.added, 2);
    assert_eq!(result.duplicates, 1);
    assert_eq!(stock_count(&state, product).await?, 2);

    let rows = stock_rows(&state, product).await?;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| !r.is_delivered && r.order_id.is_none()));
    Ok(())
}

#[tokio::test]
async fn reuploading_the_same_file_adds_nothing() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let admin = create_user(&state, Role::Admin, dec!(0)).await?;
    let product = create_product(&state, dec!(10.00)).await?;

    let text = "user1:pass1\n\n  user2:pass2  \nuser3:pass3\n";
    let first = inventory_service::ingest(&state, &admin, product, text)
        .await?
        .into_data()
        .expect("ingest result");
    assert_eq!((first.added, first.duplicates), (3, 0));

    let second = inventory_service::ingest(&state, &admin, product, text)
        .await?
        .into_data()
        .expect("ingest result");
    assert_eq!((second.added, second.duplicates), (0, 3));

    assert_eq!(stock_count(&state, product).await?, 3);
    Ok(())
}

#[tokio::test]
async fn same_content_may_exist_under_different_products() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let admin = create_user(&state, Role::Admin, dec!(0)).await?;
    let pubg = create_product(&state, dec!(10.00)).await?;
    let valorant = create_product(&state, dec!(20.00)).await?;

    for product in [pubg, valorant] {
        let result = inventory_service::ingest(&state, &admin, product, &stock_file(&["shared:secret"]))
            .await?
            .into_data()
            .expect("ingest result");
        assert_eq!(result.added, 1);
    }
    Ok(())
}

#[tokio::test]
async fn only_admins_upload_and_product_must_exist() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let manager = create_user(&state, Role::Manager, dec!(0)).await?;
    let admin = create_user(&state, Role::Admin, dec!(0)).await?;
    let product = create_product(&state, dec!(10.00)).await?;

    let denied = inventory_service::ingest(&state, &manager, product, &stock_file(&["a"])).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let missing = inventory_service::ingest(&state, &admin, uuid::Uuid::new_v4(), &stock_file(&["a"])).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    assert!(stock_rows(&state, product).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn drifted_stock_count_is_reconciled() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let admin = create_user(&state, Role::Admin, dec!(0)).await?;
    let product = create_product(&state, dec!(10.00)).await?;
    inventory_service::ingest(&state, &admin, product, &stock_file(&["a", "b", "c"])).await?;

    Products::update_many()
        .col_expr(ProdCol::StockCount, Expr::value(42))
        .filter(ProdCol::Id.eq(product))
        .exec(&state.orm)
        .await?;

    let fixed = inventory_service::reconcile_stock_count(&state, &admin, product)
        .await?
        .into_data()
        .expect("reconciled product");
    assert_eq!(fixed.stock_count, 3);
    assert_eq!(stock_count(&state, product).await?, 3);

    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            pagination: Pagination {
                page: None,
                per_page: Some(100),
            },
            threshold: Some(3),
        },
    )
    .await?
    .into_data()
    .expect("low stock list");
    assert!(low.items.iter().all(|p| p.stock_count <= 3));
    Ok(())
}

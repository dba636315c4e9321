mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;
use vaultshop_api::{error::AppError, mailer::LogMailer, models::Role, services::wallet_service};

use common::{balance, create_user, database_url, setup_state};

#[tokio::test]
async fn overdraft_fails_and_leaves_balance_untouched() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let user = create_user(&state, Role::User, dec!(30.00)).await?;

    wallet_service::debit(&state.orm, user.user_id, dec!(12.50)).await?;
    assert_eq!(balance(&state, user.user_id).await?, dec!(17.50));

    let err = wallet_service::debit(&state.orm, user.user_id, dec!(17.51)).await;
    assert!(matches!(err, Err(AppError::InsufficientBalance)));
    assert_eq!(balance(&state, user.user_id).await?, dec!(17.50));

    // spending down to exactly zero is allowed
    wallet_service::debit(&state.orm, user.user_id, dec!(17.50)).await?;
    assert_eq!(balance(&state, user.user_id).await?, dec!(0));
    Ok(())
}

#[tokio::test]
async fn credit_requires_positive_amount_and_known_user() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let user = create_user(&state, Role::User, dec!(1.00)).await?;

    let err = wallet_service::credit(&state.orm, user.user_id, dec!(0)).await;
    assert!(matches!(err, Err(AppError::InvalidAmount)));

    let err = wallet_service::credit(&state.orm, uuid::Uuid::new_v4(), dec!(5)).await;
    assert!(matches!(err, Err(AppError::NotFound)));

    wallet_service::credit(&state.orm, user.user_id, dec!(4.25)).await?;
    assert_eq!(balance(&state, user.user_id).await?, dec!(5.25));
    Ok(())
}

#[tokio::test]
async fn concurrent_debits_never_overdraw() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let user = create_user(&state, Role::User, dec!(100.00)).await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orm = state.orm.clone();
        let user_id = user.user_id;
        handles.push(tokio::spawn(async move {
            wallet_service::debit(&orm, user_id, dec!(30.00)).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => succeeded += 1,
            Err(AppError::InsufficientBalance) => {}
            Err(other) => return Err(other.into()),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(balance(&state, user.user_id).await?, dec!(10.00));
    Ok(())
}

mod common;

use std::{sync::Arc, time::Duration};

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use vaultshop_api::{
    dto::tickets::RefundRequest,
    entity::{
        ticket_messages::{Column as TicketMessageCol, Entity as TicketMessages},
        tickets::Entity as Tickets,
    },
    error::AppError,
    mailer::LogMailer,
    middleware::auth::AuthUser,
    models::{Role, TicketStatus},
    services::refund_service,
};

use common::{
    FailingMailer, RecordingMailer, SlowMailer, balance, create_ticket, create_user,
    database_url, setup_state,
};

#[tokio::test]
async fn refund_credits_wallet_and_closes_ticket() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let mailer = Arc::new(RecordingMailer::default());
    let state = setup_state(&url, mailer.clone()).await?;
    let supporter = create_user(&state, Role::Supporter, dec!(0)).await?;
    let customer = create_user(&state, Role::User, dec!(10.00)).await?;
    let ticket_id = create_ticket(&state, customer.user_id, TicketStatus::Open).await?;

    let result = refund_service::refund(
        &state,
        &supporter,
        ticket_id,
        RefundRequest {
            amount: dec!(25.00),
        },
    )
    .await?
    .into_data()
    .expect("refund result");

    assert_eq!(result.new_status, TicketStatus::Closed);
    assert!(result.new_message.is_refund);
    assert_eq!(result.new_message.user_id, supporter.user_id);
    assert!(result.new_message.message.contains("25.00"));
    assert_eq!(balance(&state, customer.user_id).await?, dec!(35.00));

    let ticket = Tickets::find_by_id(ticket_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("ticket missing"))?;
    assert_eq!(ticket.status, "CLOSED");

    let messages = TicketMessages::find()
        .filter(TicketMessageCol::TicketId.eq(ticket_id))
        .all(&state.orm)
        .await?;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_refund);

    let replied = mailer.replied.lock().unwrap().clone();
    assert_eq!(replied.len(), 1);
    assert_eq!(replied[0].ticket_id, ticket_id);
    assert_eq!(replied[0].refunded, Some(dec!(25.00)));
    Ok(())
}

#[tokio::test]
async fn closed_ticket_cannot_be_refunded_twice() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let admin = create_user(&state, Role::Admin, dec!(0)).await?;
    let customer = create_user(&state, Role::User, dec!(0)).await?;
    let ticket_id = create_ticket(&state, customer.user_id, TicketStatus::Answered).await?;

    refund_service::refund(&state, &admin, ticket_id, RefundRequest { amount: dec!(5) }).await?;
    let again =
        refund_service::refund(&state, &admin, ticket_id, RefundRequest { amount: dec!(5) }).await;
    assert!(matches!(again, Err(AppError::TicketClosed)));
    assert_eq!(balance(&state, customer.user_id).await?, dec!(5.00));

    let closed = create_ticket(&state, customer.user_id, TicketStatus::Closed).await?;
    let err = refund_service::refund(&state, &admin, closed, RefundRequest { amount: dec!(1) }).await;
    assert!(matches!(err, Err(AppError::TicketClosed)));
    Ok(())
}

#[tokio::test]
async fn refund_requires_staff_and_positive_amount() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(LogMailer)).await?;
    let manager = create_user(&state, Role::Manager, dec!(0)).await?;
    let customer = create_user(&state, Role::User, dec!(10.00)).await?;
    let ticket_id = create_ticket(&state, customer.user_id, TicketStatus::Open).await?;

    let denied =
        refund_service::refund(&state, &customer, ticket_id, RefundRequest { amount: dec!(50) })
            .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let zero =
        refund_service::refund(&state, &manager, ticket_id, RefundRequest { amount: dec!(0) })
            .await;
    assert!(matches!(zero, Err(AppError::InvalidAmount)));

    let negative = refund_service::refund(
        &state,
        &manager,
        ticket_id,
        RefundRequest {
            amount: dec!(-3.50),
        },
    )
    .await;
    assert!(matches!(negative, Err(AppError::InvalidAmount)));

    let missing = refund_service::refund(
        &state,
        &manager,
        uuid::Uuid::new_v4(),
        RefundRequest { amount: dec!(1) },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    assert_eq!(balance(&state, customer.user_id).await?, dec!(10.00));
    Ok(())
}

#[tokio::test]
async fn refund_survives_mail_outage_and_slow_relay() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Arc::new(FailingMailer)).await?;
    let supporter = create_user(&state, Role::Supporter, dec!(0)).await?;
    let customer = create_user(&state, Role::User, dec!(10.00)).await?;
    let ticket_id = create_ticket(&state, customer.user_id, TicketStatus::Open).await?;

    let refund = RefundRequest { amount: dec!(5) };
    let result = refund_service::refund(&state, &supporter, ticket_id, refund)
        .await?
        .into_data()
        .expect("refund result");
    assert_eq!(result.new_status, TicketStatus::Closed);
    assert_eq!(balance(&state, customer.user_id).await?, dec!(15.00));

    let mut slow = setup_state(
        &url,
        Arc::new(SlowMailer {
            delay: Duration::from_secs(2),
        }),
    )
    .await?;
    slow.tx_timeout = Duration::from_secs(1);
    let second = create_ticket(&slow, customer.user_id, TicketStatus::Open).await?;
    refund_service::refund(&slow, &supporter, second, RefundRequest { amount: dec!(5) }).await?;
    assert_eq!(balance(&slow, customer.user_id).await?, dec!(20.00));
    Ok(())
}

// A failure on the last write undoes the credit and the status change.
#[tokio::test]
async fn failed_refund_leaves_ticket_open_and_balance_unchanged() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let mailer = Arc::new(RecordingMailer::default());
    let state = setup_state(&url, mailer.clone()).await?;
    let customer = create_user(&state, Role::User, dec!(10.00)).await?;
    let ticket_id = create_ticket(&state, customer.user_id, TicketStatus::Open).await?;

    // A session whose user row is gone: the refund message cannot reference it.
    let ghost = AuthUser {
        user_id: uuid::Uuid::new_v4(),
        role: Role::Admin,
    };
    let refund = RefundRequest { amount: dec!(25) };
    let err = refund_service::refund(&state, &ghost, ticket_id, refund).await;
    assert!(matches!(err, Err(AppError::OrmError(_))));

    assert_eq!(balance(&state, customer.user_id).await?, dec!(10.00));
    let ticket = Tickets::find_by_id(ticket_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("ticket missing"))?;
    assert_eq!(ticket.status, "OPEN");
    let messages = TicketMessages::find()
        .filter(TicketMessageCol::TicketId.eq(ticket_id))
        .count(&state.orm)
        .await?;
    assert_eq!(messages, 0);
    assert!(mailer.replied.lock().unwrap().is_empty());
    Ok(())
}

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    activity::NewActivity,
    db::with_timeout,
    dto::tickets::{RefundRequest, RefundResult},
    entity::{
        ticket_messages::ActiveModel as TicketMessageActive,
        tickets::{Column as TicketCol, Entity as Tickets},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    mailer::TicketRepliedEmail,
    middleware::auth::{AuthUser, ensure_staff},
    models::{TicketMessage, TicketStatus, parse_status},
    response::{ApiResponse, Meta},
    services::wallet_service,
    state::AppState,
    unit_of_work::{PostCommit, UnitOfWork},
};

/// Credits the ticket owner's wallet, closes the ticket and records a refund
/// message, all in one transaction.
pub async fn refund(
    state: &AppState,
    staff: &AuthUser,
    ticket_id: Uuid,
    payload: RefundRequest,
) -> AppResult<ApiResponse<RefundResult>> {
    ensure_staff(staff)?;
    let amount = payload.amount;
    wallet_service::ensure_positive_amount(amount)?;

    let (message, committed) = with_timeout(state.tx_timeout, async {
        let mut uow = UnitOfWork::begin(&state.orm).await?;

        let ticket = Tickets::find_by_id(ticket_id)
            .lock(LockType::Update)
            .one(uow.conn())
            .await?
            .ok_or(AppError::NotFound)?;
        if parse_status::<TicketStatus>(&ticket.status)? == TicketStatus::Closed {
            return Err(AppError::TicketClosed);
        }

        wallet_service::credit(uow.conn(), ticket.user_id, amount).await?;

        Tickets::update_many()
            .col_expr(TicketCol::Status, Expr::value(TicketStatus::Closed.as_str()))
            .col_expr(TicketCol::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(TicketCol::Id.eq(ticket.id))
            .exec(uow.conn())
            .await?;

        let message = TicketMessageActive {
            id: Set(Uuid::new_v4()),
            ticket_id: Set(ticket.id),
            user_id: Set(staff.user_id),
            message: Set(format!(
                "A refund of {amount} TL has been credited to your balance."
            )),
            is_refund: Set(true),
            created_at: NotSet,
        }
        .insert(uow.conn())
        .await?;

        if let Some(owner) = Users::find_by_id(ticket.user_id).one(uow.conn()).await? {
            uow.after_commit(PostCommit::TicketReplied(TicketRepliedEmail {
                to: owner.email,
                name: owner.name,
                ticket_id: ticket.id,
                subject: ticket.subject.clone(),
                refunded: Some(amount),
            }));
        }
        uow.after_commit(PostCommit::Activity(NewActivity::new(
            "ticket_refund",
            format!("Refunded {amount} TL on ticket {}", ticket.id),
            Some(staff.user_id),
        )));

        let committed = uow.commit().await?;
        Ok((message, committed))
    })
    .await?;
    committed.run_hooks(state).await;

    tracing::info!(%ticket_id, staff_id = %staff.user_id, %amount, "ticket refunded");

    Ok(ApiResponse::success(
        "Refund issued",
        RefundResult {
            new_status: TicketStatus::Closed,
            new_message: TicketMessage::from(message),
        },
        Some(Meta::empty()),
    ))
}

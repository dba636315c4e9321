use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::wallet::Balance,
    entity::users::{Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Money amounts carry at most two fractional digits.
pub const MONEY_SCALE: u32 = 2;

pub fn ensure_positive_amount(amount: Decimal) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidAmount);
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(AppError::Validation(
            "amount has more than two decimal places".into(),
        ));
    }
    Ok(())
}

/// Takes `amount` from the user's balance.
///
/// The check and the decrement are one guarded UPDATE, so concurrent debits
/// cannot both spend the same funds.
pub async fn debit<C>(conn: &C, user_id: Uuid, amount: Decimal) -> AppResult<()>
where
    C: ConnectionTrait,
{
    ensure_positive_amount(amount)?;

    let res = Users::update_many()
        .col_expr(UserCol::Balance, Expr::col(UserCol::Balance).sub(amount))
        .filter(UserCol::Id.eq(user_id))
        .filter(UserCol::Balance.gte(amount))
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        let exists = Users::find_by_id(user_id).count(conn).await?;
        return Err(if exists == 0 {
            AppError::NotFound
        } else {
            AppError::InsufficientBalance
        });
    }
    Ok(())
}

pub async fn credit<C>(conn: &C, user_id: Uuid, amount: Decimal) -> AppResult<()>
where
    C: ConnectionTrait,
{
    ensure_positive_amount(amount)?;

    let res = Users::update_many()
        .col_expr(UserCol::Balance, Expr::col(UserCol::Balance).add(amount))
        .filter(UserCol::Id.eq(user_id))
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn balance_of<C>(conn: &C, user_id: Uuid) -> AppResult<Decimal>
where
    C: ConnectionTrait,
{
    let user = Users::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(user.balance)
}

pub async fn get_balance(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Balance>> {
    let balance = balance_of(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success(
        "Ok",
        Balance {
            user_id: user.user_id,
            balance,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn zero_and_negative_amounts_are_invalid() {
        assert!(matches!(
            ensure_positive_amount(Decimal::ZERO),
            Err(AppError::InvalidAmount)
        ));
        assert!(matches!(
            ensure_positive_amount(Decimal::from_str("-1.00").unwrap()),
            Err(AppError::InvalidAmount)
        ));
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        assert!(matches!(
            ensure_positive_amount(Decimal::from_str("1.005").unwrap()),
            Err(AppError::Validation(_))
        ));
        // trailing zeros do not count as precision
        assert!(ensure_positive_amount(Decimal::from_str("25.000").unwrap()).is_ok());
    }
}

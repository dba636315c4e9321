use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::wallet::Balance,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::wallet_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_balance))
}

#[utoipa::path(
    get,
    path = "/api/wallet",
    responses(
        (status = 200, description = "Current balance", body = ApiResponse<Balance>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Balance>>> {
    let resp = wallet_service::get_balance(&state, &user).await?;
    Ok(Json(resp))
}

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::tickets::{RefundRequest, RefundResult},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::refund_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/refund", post(refund_ticket))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/refund",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Balance credited and ticket closed", body = ApiResponse<RefundResult>),
        (status = 400, description = "Ticket already closed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid amount"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn refund_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<ApiResponse<RefundResult>>> {
    let resp = refund_service::refund(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::stock::{IngestResult, StockUploadForm},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::ApiResponse,
    services::inventory_service,
    state::AppState,
};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_stock))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[utoipa::path(
    post,
    path = "/api/stock/upload",
    request_body(content = StockUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Lines added and duplicates skipped", body = ApiResponse<IngestResult>),
        (status = 400, description = "Missing productId or file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stock"
)]
pub async fn upload_stock(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<IngestResult>>> {
    ensure_admin(&user)?;

    let mut product_id: Option<Uuid> = None;
    let mut text: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "productId" | "product_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation("productId is not a valid id".into()))?;
                product_id = Some(id);
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                let body = String::from_utf8(bytes.to_vec())
                    .map_err(|_| AppError::Validation("file must be UTF-8 text".into()))?;
                text = Some(body);
            }
            _ => {}
        }
    }

    let (Some(product_id), Some(text)) = (product_id, text) else {
        return Err(AppError::BadRequest("productId and file are required".into()));
    };

    let resp = inventory_service::ingest(&state, &user, product_id, &text).await?;
    Ok(Json(resp))
}

use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
        tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let database = match state.orm.ping().await {
        Ok(_) => "up",
        Err(err) => {
            tracing::warn!(error = %err, "health check query failed");
            "down"
        }
    };

    Json(health_body(database))
}

pub fn health_body(database: &str) -> ApiResponse<HealthData> {
    let data = HealthData {
        status: if database == "up" { "ok" } else { "degraded" }.to_string(),
        database: database.to_string(),
    };
    ApiResponse::success("Health check", data, Some(Meta::empty()))
}

use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod stock;
pub mod tickets;
pub mod wallet;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/wallet", wallet::router())
        .nest("/stock", stock::router(max_upload_bytes))
        .nest("/tickets", tickets::router())
        .nest("/admin", admin::router())
}

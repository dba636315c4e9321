use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{TicketMessage, TicketStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefundResult {
    pub new_status: TicketStatus,
    pub new_message: TicketMessage,
}

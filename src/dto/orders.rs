use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{DeliveredItem, DeliveryLog, Order, OrderItem};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    /// Total the client displayed; rejected when it no longer matches current prices.
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeliverRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub delivery: DeliveryOutcome,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub delivered: Vec<DeliveredItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryLogList {
    pub items: Vec<DeliveryLog>,
}

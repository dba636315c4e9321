use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    delivery_logs::Model as DeliveryLogModel, order_items::Model as OrderItemModel,
    orders::Model as OrderModel, products::Model as ProductModel,
    ticket_messages::Model as TicketMessageModel,
};

/// Declares a string-backed status enum stored as TEXT.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(anyhow::anyhow!(
                        "unknown {} `{}`",
                        stringify!($name),
                        other
                    )),
                }
            }
        }
    };
}

text_enum!(
    Role {
        User => "USER",
        Admin => "ADMIN",
        Manager => "MANAGER",
        Supporter => "SUPPORTER",
        Banned => "BANNED",
    }
);

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Supporter)
    }
}

text_enum!(
    /// Payment/processing lifecycle of an order.
    OrderStatus {
        Pending => "PENDING",
        Processing => "PROCESSING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Canceled => "CANCELED",
    }
);

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Failed | OrderStatus::Canceled
        )
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending | Processing, Completed)
                | (Pending | Processing, Failed)
                | (Pending | Processing, Canceled)
        )
    }
}

text_enum!(
    /// Fulfillment lifecycle; only leaves PENDING once the order is COMPLETED.
    DeliveryStatus {
        Pending => "PENDING",
        Delivered => "DELIVERED",
        Failed => "FAILED",
    }
);

text_enum!(
    TicketStatus {
        Open => "OPEN",
        Answered => "ANSWERED",
        Closed => "CLOSED",
    }
);

text_enum!(
    DeliveryLogStatus {
        Success => "SUCCESS",
        Failed => "FAILED",
    }
);

/// Reads a persisted status column, treating unknown values as corrupt data.
pub fn parse_status<T>(raw: &str) -> crate::error::AppResult<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    raw.parse::<T>().map_err(crate::error::AppError::Internal)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub stock_count: i32,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            price: model.price,
            stock_count: model.stock_count,
            category_id: model.category_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub delivery_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            total_amount: model.total_amount,
            status: model.status,
            delivery_status: model.delivery_status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// A stock unit as shown to its buyer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveredItem {
    pub stock_id: Uuid,
    pub product_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryLog {
    pub id: Uuid,
    pub order_id: Uuid,
    pub stock_id: String,
    pub status: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<DeliveryLogModel> for DeliveryLog {
    fn from(model: DeliveryLogModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            stock_id: model.stock_id,
            status: model.status,
            message: model.message,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub is_refund: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TicketMessageModel> for TicketMessage {
    fn from(model: TicketMessageModel) -> Self {
        Self {
            id: model.id,
            ticket_id: model.ticket_id,
            user_id: model.user_id,
            message: model.message,
            is_refund: model.is_refund,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_round_trip_through_text() {
        assert_eq!("DELIVERED".parse::<DeliveryStatus>().unwrap(), DeliveryStatus::Delivered);
        assert_eq!(OrderStatus::Canceled.as_str(), "CANCELED");
        assert!("delivered".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn terminal_order_states_are_final() {
        for terminal in [OrderStatus::Completed, OrderStatus::Failed, OrderStatus::Canceled] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(OrderStatus::Processing));
            assert!(!terminal.can_transition_to(OrderStatus::Canceled));
        }
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn only_admin_manager_supporter_are_staff() {
        assert!(Role::Supporter.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::User.is_staff());
        assert!(!Role::Banned.is_staff());
    }

    #[test]
    fn roles_serialize_in_upper_case() {
        let json = serde_json::to_string(&Role::Supporter).unwrap();
        assert_eq!(json, "\"SUPPORTER\"");
    }
}

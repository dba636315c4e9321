pub mod admin_service;
pub mod fulfillment_service;
pub mod inventory_service;
pub mod order_service;
pub mod refund_service;
pub mod wallet_service;

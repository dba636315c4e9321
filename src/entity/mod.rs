pub mod activity_logs;
pub mod delivery_logs;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod stock;
pub mod ticket_messages;
pub mod tickets;
pub mod users;

pub use activity_logs::Entity as ActivityLogs;
pub use delivery_logs::Entity as DeliveryLogs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use stock::Entity as Stock;
pub use ticket_messages::Entity as TicketMessages;
pub use tickets::Entity as Tickets;
pub use users::Entity as Users;

pub mod orders;
pub mod products;
pub mod stock;
pub mod tickets;
pub mod wallet;

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod images;
pub mod orders;
pub mod payment;
pub mod products;

//! Business services for the commerce core.

pub mod cart;
pub mod identity;
pub mod order;

pub use cart::CartService;
pub use order::OrderService;

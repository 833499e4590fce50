//! Domain models for the commerce core.
//!
//! These types represent validated domain objects separate from database
//! row types; the presentation layer serializes them as it sees fit.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartLine, CartSummary};
pub use order::{Order, OrderLine, OrderSummary};
pub use product::Product;

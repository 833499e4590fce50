//! Madrona Store - the transactional commerce core.
//!
//! This library owns the cart-to-order pipeline for Madrona Market:
//!
//! - [`services::identity`] - maps a request to a cart/order owner key
//! - [`services::cart`] - cart and cart-line lifecycle, validated against
//!   live inventory
//! - [`services::order`] - atomic cart-to-order conversion, the order
//!   status state machine, and cancellation with restock
//! - [`db`] - `PostgreSQL` access via sqlx, including the conditional
//!   stock adjustments the order lifecycle relies on
//!
//! # Architecture
//!
//! The crate is a library by design: HTTP routing, request validation and
//! response shaping live in a separate presentation layer that calls into
//! these services with an explicit [`madrona_core::OwnerKey`]. All stock
//! checks-and-adjustments are conditional single-statement updates, and
//! order creation runs as one all-or-nothing database transaction, so
//! concurrent checkouts can never oversell or half-commit.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod models;
pub mod services;

pub use config::{ConfigError, StoreConfig};
pub use db::RepositoryError;
pub use services::cart::{CartError, CartService};
pub use services::identity::{IdentityError, resolve_owner};
pub use services::order::{OrderError, OrderService};

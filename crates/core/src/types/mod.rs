//! Core types for Madrona Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod owner;
pub mod status;

pub use id::*;
pub use owner::{OwnerKey, SessionToken, SessionTokenError};
pub use status::OrderStatus;

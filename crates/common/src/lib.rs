//! Shared types for the bookstore backend.

pub mod types;

pub use types::{Money, OrderId, OrderItemId, Principal, ProductId, Role, UserId};

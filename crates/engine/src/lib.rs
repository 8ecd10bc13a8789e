//! Order workflow engine for the bookstore backend.
//!
//! The engine owns the only code path allowed to move stock or change an
//! order's lifecycle:
//! - [`ledger`] — reads/locks/adjusts per-product available quantity.
//! - [`engine::OrderEngine::create_order`] — validates, totals, and writes
//!   an order with its line items in one transaction.
//! - [`diff`] + [`engine::OrderEngine::update_items`] — reconciles a
//!   submitted item list against existing line items.
//! - [`status::OrderStatus`] — the lifecycle state machine.

pub mod diff;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod model;
pub mod status;

pub use diff::{ItemChange, RequestedItem};
pub use engine::{NewOrder, NewOrderItem, OrderEngine};
pub use error::{EngineError, Result};
pub use ledger::LockedProduct;
pub use model::{Order, OrderItem};
pub use status::OrderStatus;

//! Row types and their mappers.
//!
//! Rows carry strongly-typed identifiers and cent amounts, but leave
//! free-form columns (order status, role) as text for the domain layer to
//! interpret.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, ProductId, UserId};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::Result;

/// A user account row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn row_to_user(row: PgRow) -> Result<UserRow> {
    Ok(UserRow {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        fullname: row.try_get("fullname")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        address: row.try_get("address")?,
        phone_number: row.try_get("phone_number")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
    })
}

/// An author row.
#[derive(Debug, Clone)]
pub struct AuthorRow {
    pub id: Uuid,
    pub name: String,
    pub year_of_birth: Option<chrono::NaiveDate>,
    pub year_of_death: Option<chrono::NaiveDate>,
    pub hometown: Option<String>,
}

pub(crate) fn row_to_author(row: PgRow) -> Result<AuthorRow> {
    Ok(AuthorRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        year_of_birth: row.try_get("year_of_birth")?,
        year_of_death: row.try_get("year_of_death")?,
        hometown: row.try_get("hometown")?,
    })
}

/// A publisher row.
#[derive(Debug, Clone)]
pub struct PublisherRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
}

pub(crate) fn row_to_publisher(row: PgRow) -> Result<PublisherRow> {
    Ok(PublisherRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
    })
}

/// A product category row.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

pub(crate) fn row_to_category(row: PgRow) -> Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
    })
}

/// A catalog product row.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: ProductId,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: i64,
    pub image_url: Option<String>,
}

pub(crate) fn row_to_product(row: PgRow) -> Result<ProductRow> {
    Ok(ProductRow {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        category_id: row.try_get("category_id")?,
        author_id: row.try_get("author_id")?,
        publisher_id: row.try_get("publisher_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock_quantity: row.try_get("stock_quantity")?,
        image_url: row.try_get("image_url")?,
    })
}

/// An order row. `status` is interpreted by the engine's state machine.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: String,
    pub total_amount: Money,
    pub shipping_address: String,
    pub shipping_phone: Option<String>,
    pub payment_method: String,
    pub order_date: DateTime<Utc>,
}

pub(crate) fn row_to_order(row: PgRow) -> Result<OrderRow> {
    Ok(OrderRow {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        status: row.try_get("status")?,
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        shipping_address: row.try_get("shipping_address")?,
        shipping_phone: row.try_get("shipping_phone")?,
        payment_method: row.try_get("payment_method")?,
        order_date: row.try_get("order_date")?,
    })
}

/// A line item row. `price_at_purchase` is snapshotted when the item is
/// added and never re-priced afterwards.
#[derive(Debug, Clone)]
pub struct OrderItemRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price_at_purchase: Money,
}

pub(crate) fn row_to_order_item(row: PgRow) -> Result<OrderItemRow> {
    Ok(OrderItemRow {
        id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: row.try_get("quantity")?,
        price_at_purchase: Money::from_cents(row.try_get("price_at_purchase_cents")?),
    })
}


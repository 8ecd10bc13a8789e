//! Order workflow endpoints.
//!
//! These handlers are a thin layer over the engine: they deserialize the
//! request, hand the principal and typed arguments to the engine, and shape
//! the result. All locking, validation, and lifecycle decisions happen in
//! the engine's transactions.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, OrderId, ProductId};
use engine::{NewOrder, NewOrderItem, Order, RequestedItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::auth::AuthPrincipal;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub shipping_phone: Option<String>,
    pub payment_method: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Deserialize)]
pub struct UpdateItemsRequest {
    pub items: Vec<RequestedItemBody>,
}

#[derive(Deserialize)]
pub struct RequestedItemBody {
    pub product_id: Uuid,
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
    pub status: String,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct UpdateItemsResponse {
    pub order_id: OrderId,
    pub total_cents: i64,
}

// -- Handlers --

/// POST /orders — place a new order.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    if req.shipping_address.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "shipping_address must not be empty".to_string(),
        ));
    }

    let order = NewOrder {
        shipping_address: req.shipping_address,
        shipping_phone: req.shipping_phone,
        payment_method: req.payment_method,
        items: req
            .items
            .iter()
            .map(|item| NewOrderItem {
                product_id: ProductId::from_uuid(item.product_id),
                quantity: item.quantity,
                unit_price: Money::from_cents(item.unit_price_cents),
            })
            .collect(),
    };

    let created = state.engine.create_order(&principal, order).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: created.id,
            status: created.status.to_string(),
            total_cents: created.total_amount.cents(),
        }),
    ))
}

/// GET /orders/me — the caller's non-cancelled orders, newest first.
#[tracing::instrument(skip(state), fields(user_id = %principal.id))]
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.engine.list_orders(&principal).await?;
    Ok(Json(orders))
}

/// GET /orders/{id} — one order with items.
#[tracing::instrument(skip(state), fields(user_id = %principal.id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .engine
        .get_order(&principal, OrderId::from_uuid(id))
        .await?;
    Ok(Json(order))
}

/// PUT /orders/{id}/cancel — cancel an order and restore its stock.
#[tracing::instrument(skip(state), fields(user_id = %principal.id))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .engine
        .cancel_order(&principal, OrderId::from_uuid(id))
        .await?;
    Ok(Json(order))
}

/// PUT /orders/{id}/items — reconcile the order's line items against the
/// submitted list and return the recomputed total.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.id))]
pub async fn update_items(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemsRequest>,
) -> Result<Json<UpdateItemsResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    let requested: Vec<RequestedItem> = req
        .items
        .iter()
        .map(|item| RequestedItem {
            product_id: ProductId::from_uuid(item.product_id),
            quantity: item.quantity,
        })
        .collect();

    let total = state
        .engine
        .update_items(&principal, order_id, &requested)
        .await?;

    Ok(Json(UpdateItemsResponse {
        order_id,
        total_cents: total.cents(),
    }))
}

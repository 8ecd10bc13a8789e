//! Admin-only endpoints: order status updates, catalog writes, revenue
//! statistics.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, OrderId, ProductId};
use engine::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use store::products::ProductPatch;
use store::stats::StatsPeriod;
use uuid::Uuid;

use crate::AppState;
use crate::auth::AdminPrincipal;
use crate::error::ApiError;
use crate::routes::products::ProductResponse;

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct RevenueBucketResponse {
    pub time_period: String,
    pub revenue_cents: i64,
    pub order_count: i64,
}

// -- Handlers --

/// PUT /admin/orders/{id} — advance an order's lifecycle status.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.id))]
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let target = OrderStatus::parse(&req.status)
        .map_err(|_| ApiError::BadRequest(format!("unknown status: {}", req.status)))?;

    let order = state
        .engine
        .set_status(&principal, OrderId::from_uuid(id), target)
        .await?;
    Ok(Json(order))
}

/// POST /admin/products — add a product to the catalog.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.id))]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(
            "price_cents must not be negative".to_string(),
        ));
    }
    if req.stock_quantity < 0 {
        return Err(ApiError::BadRequest(
            "stock_quantity must not be negative".to_string(),
        ));
    }

    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let id = store::products::insert(
        &mut conn,
        &store::products::NewProduct {
            title: req.title,
            price: Money::from_cents(req.price_cents),
            stock_quantity: req.stock_quantity,
            category_id: req.category_id,
            author_id: req.author_id,
            publisher_id: req.publisher_id,
            description: req.description,
            image_url: req.image_url,
        },
    )
    .await?;

    let row = store::products::get(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::Internal("product vanished after insert".to_string()))?;

    tracing::info!(product_id = %id, "product created");

    Ok((StatusCode::CREATED, Json(ProductResponse::from(row))))
}

/// PUT /admin/products/{id} — partial product update (including restock).
#[tracing::instrument(skip(state, req), fields(user_id = %principal.id))]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    if req.price_cents.is_some_and(|p| p < 0) {
        return Err(ApiError::BadRequest(
            "price_cents must not be negative".to_string(),
        ));
    }
    if req.stock_quantity.is_some_and(|q| q < 0) {
        return Err(ApiError::BadRequest(
            "stock_quantity must not be negative".to_string(),
        ));
    }

    let patch = ProductPatch {
        category_id: req.category_id,
        author_id: req.author_id,
        publisher_id: req.publisher_id,
        title: req.title,
        description: req.description,
        price: req.price_cents.map(Money::from_cents),
        stock_quantity: req.stock_quantity,
        image_url: req.image_url,
    };

    let product_id = ProductId::from_uuid(id);
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    store::products::update(&mut conn, product_id, &patch).await?;

    let row = store::products::get(&mut conn, product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductResponse::from(row)))
}

/// GET /admin/stats/revenue?period=day|week|month|year — revenue and order
/// counts bucketed by period, cancelled orders excluded.
#[tracing::instrument(skip(state, query), fields(user_id = %principal.id))]
pub async fn revenue_stats(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<RevenueBucketResponse>>, ApiError> {
    let period = query.period.as_deref().unwrap_or("month");
    let period = StatsPeriod::parse(period)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown period: {period}")))?;

    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let buckets = store::stats::revenue_by_period(&mut conn, period).await?;

    Ok(Json(
        buckets
            .into_iter()
            .map(|b| RevenueBucketResponse {
                time_period: b.time_period,
                revenue_cents: b.revenue.cents(),
                order_count: b.order_count,
            })
            .collect(),
    ))
}

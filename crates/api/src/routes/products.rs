//! Public catalog browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::products::ProductFilter;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize, Default)]
pub struct ListProductsQuery {
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub title: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub image_url: Option<String>,
}

impl From<store::ProductRow> for ProductResponse {
    fn from(row: store::ProductRow) -> Self {
        ProductResponse {
            id: row.id,
            category_id: row.category_id,
            author_id: row.author_id,
            publisher_id: row.publisher_id,
            title: row.title,
            description: row.description,
            price_cents: row.price.cents(),
            stock_quantity: row.stock_quantity,
            image_url: row.image_url,
        }
    }
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl From<store::CategoryRow> for CategoryResponse {
    fn from(row: store::CategoryRow) -> Self {
        CategoryResponse {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
        }
    }
}

/// GET /products — filterable catalog listing.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    if let Some(limit) = query.limit
        && !(1..=500).contains(&limit)
    {
        return Err(ApiError::BadRequest(
            "limit must be between 1 and 500".to_string(),
        ));
    }

    let filter = ProductFilter {
        category_id: query.category_id,
        author_id: query.author_id,
        publisher_id: query.publisher_id,
        min_price: query.min_price_cents.map(Money::from_cents),
        max_price: query.max_price_cents.map(Money::from_cents),
        title: query.title,
        limit: query.limit,
        offset: query.offset,
    };

    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let rows = store::products::list(&mut conn, filter).await?;

    Ok(Json(rows.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products/{id} — one product.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let row = store::products::get(&mut conn, ProductId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductResponse::from(row)))
}

#[derive(Serialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub name: String,
    pub year_of_birth: Option<chrono::NaiveDate>,
    pub year_of_death: Option<chrono::NaiveDate>,
    pub hometown: Option<String>,
}

impl From<store::AuthorRow> for AuthorResponse {
    fn from(row: store::AuthorRow) -> Self {
        AuthorResponse {
            id: row.id,
            name: row.name,
            year_of_birth: row.year_of_birth,
            year_of_death: row.year_of_death,
            hometown: row.hometown,
        }
    }
}

#[derive(Serialize)]
pub struct PublisherResponse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
}

impl From<store::PublisherRow> for PublisherResponse {
    fn from(row: store::PublisherRow) -> Self {
        PublisherResponse {
            id: row.id,
            name: row.name,
            address: row.address,
        }
    }
}

/// GET /products/categories — all categories.
#[tracing::instrument(skip(state))]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let rows = store::categories::list(&mut conn).await?;

    Ok(Json(rows.into_iter().map(CategoryResponse::from).collect()))
}

/// GET /products/categories/{id} — one category.
#[tracing::instrument(skip(state))]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let row = store::categories::get(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(CategoryResponse::from(row)))
}

/// GET /products/authors — all authors.
#[tracing::instrument(skip(state))]
pub async fn list_authors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AuthorResponse>>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let rows = store::authors::list(&mut conn).await?;

    Ok(Json(rows.into_iter().map(AuthorResponse::from).collect()))
}

/// GET /products/authors/{id} — one author.
#[tracing::instrument(skip(state))]
pub async fn get_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthorResponse>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let row = store::authors::get(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    Ok(Json(AuthorResponse::from(row)))
}

/// GET /products/publishers — all publishers.
#[tracing::instrument(skip(state))]
pub async fn list_publishers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PublisherResponse>>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let rows = store::publishers::list(&mut conn).await?;

    Ok(Json(rows.into_iter().map(PublisherResponse::from).collect()))
}

/// GET /products/publishers/{id} — one publisher.
#[tracing::instrument(skip(state))]
pub async fn get_publisher(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublisherResponse>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let row = store::publishers::get(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Publisher not found".to_string()))?;

    Ok(Json(PublisherResponse::from(row)))
}

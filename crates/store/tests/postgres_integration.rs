//! Store-layer integration tests against real PostgreSQL.
//!
//! One shared container; each test gets a fresh pool and truncated tables.

use std::sync::Arc;

use common::{Money, Role};
use sqlx::PgPool;
use store::products::{NewProduct, ProductFilter, ProductPatch};
use store::stats::StatsPeriod;
use store::users::UserPatch;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, products, categories, authors, publishers, users CASCADE",
    )
        .execute(&pool)
        .await
        .unwrap();

    pool
}

#[tokio::test]
#[serial_test::serial]
async fn user_roundtrip_and_patch() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let id = store::users::insert(
        &mut conn,
        "Ada Lovelace",
        "ada@example.com",
        "hash",
        Some("12 Analytical Way"),
        None,
        Role::Customer,
    )
    .await
    .unwrap();

    let user = store::users::get_by_email(&mut conn, "ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.role, "customer");
    assert_eq!(user.address.as_deref(), Some("12 Analytical Way"));

    // Patch only the phone number; the rest stays.
    let affected = store::users::update(
        &mut conn,
        id,
        &UserPatch {
            phone_number: Some("555-0100".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(affected, 1);

    let user = store::users::get(&mut conn, id).await.unwrap().unwrap();
    assert_eq!(user.phone_number.as_deref(), Some("555-0100"));
    assert_eq!(user.fullname, "Ada Lovelace");

    // Empty patch touches nothing.
    let affected = store::users::update(&mut conn, id, &UserPatch::default())
        .await
        .unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
#[serial_test::serial]
async fn duplicate_email_violates_unique_constraint() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    store::users::insert(&mut conn, "A", "dup@example.com", "h", None, None, Role::Customer)
        .await
        .unwrap();
    let err = store::users::insert(&mut conn, "B", "dup@example.com", "h", None, None, Role::Customer)
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

fn new_product(title: &str, price_cents: i64, stock: i64) -> NewProduct {
    NewProduct {
        title: title.to_string(),
        price: Money::from_cents(price_cents),
        stock_quantity: stock,
        ..Default::default()
    }
}

#[tokio::test]
#[serial_test::serial]
async fn product_listing_filters() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let fiction = store::categories::insert(&mut conn, "Science Fiction", None)
        .await
        .unwrap();
    let herbert = store::authors::insert(&mut conn, "Frank Herbert", None, None, None)
        .await
        .unwrap();
    store::products::insert(
        &mut conn,
        &NewProduct {
            category_id: Some(fiction),
            author_id: Some(herbert),
            ..new_product("Dune", 1500, 3)
        },
    )
    .await
    .unwrap();
    store::products::insert(
        &mut conn,
        &NewProduct {
            category_id: Some(fiction),
            author_id: Some(herbert),
            ..new_product("Dune Messiah", 900, 3)
        },
    )
    .await
    .unwrap();
    store::products::insert(&mut conn, &new_product("Cookbook", 2500, 1))
        .await
        .unwrap();

    let all = store::products::list(&mut conn, ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let in_category = store::products::list(
        &mut conn,
        ProductFilter {
            category_id: Some(fiction),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(in_category.len(), 2);

    let cheap_dune = store::products::list(
        &mut conn,
        ProductFilter {
            title: Some("dune".to_string()),
            max_price: Some(Money::from_cents(1000)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cheap_dune.len(), 1);
    assert_eq!(cheap_dune[0].title, "Dune Messiah");

    let by_author = store::products::list(
        &mut conn,
        ProductFilter {
            author_id: Some(herbert),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_author.len(), 2);

    let paged = store::products::list(
        &mut conn,
        ProductFilter {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(paged.len(), 1);
}

#[tokio::test]
#[serial_test::serial]
async fn product_patch_applies_only_set_fields() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let id = store::products::insert(&mut conn, &new_product("Dune", 1500, 3))
        .await
        .unwrap();

    store::products::update(
        &mut conn,
        id,
        &ProductPatch {
            price: Some(Money::from_cents(1800)),
            stock_quantity: Some(10),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let product = store::products::get(&mut conn, id).await.unwrap().unwrap();
    assert_eq!(product.price.cents(), 1800);
    assert_eq!(product.stock_quantity, 10);
    assert_eq!(product.title, "Dune");
}

#[tokio::test]
#[serial_test::serial]
async fn category_slug_is_generated() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let id = store::categories::insert(&mut conn, "Kids & Young Adults", Some("All ages"))
        .await
        .unwrap();
    let category = store::categories::get(&mut conn, id).await.unwrap().unwrap();
    assert_eq!(category.slug, "kids-young-adults");

    let listed = store::categories::list(&mut conn).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[serial_test::serial]
async fn authors_and_publishers_roundtrip() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let born = chrono::NaiveDate::from_ymd_opt(1920, 10, 8).unwrap();
    let herbert = store::authors::insert(&mut conn, "Frank Herbert", Some(born), None, Some("Tacoma"))
        .await
        .unwrap();
    let chilton = store::publishers::insert(&mut conn, "Chilton Books", Some("Philadelphia"))
        .await
        .unwrap();

    let author = store::authors::get(&mut conn, herbert).await.unwrap().unwrap();
    assert_eq!(author.name, "Frank Herbert");
    assert_eq!(author.year_of_birth, Some(born));
    assert_eq!(author.year_of_death, None);

    let publisher = store::publishers::get(&mut conn, chilton).await.unwrap().unwrap();
    assert_eq!(publisher.address.as_deref(), Some("Philadelphia"));

    assert_eq!(store::authors::list(&mut conn).await.unwrap().len(), 1);
    assert_eq!(store::publishers::list(&mut conn).await.unwrap().len(), 1);
    assert!(
        store::authors::get(&mut conn, uuid::Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial_test::serial]
async fn order_total_recomputes_from_items() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let user_id = store::users::insert(&mut conn, "A", "a@example.com", "h", None, None, Role::Customer)
        .await
        .unwrap();
    let p1 = store::products::insert(&mut conn, &new_product("Dune", 1500, 3))
        .await
        .unwrap();

    let order_id = store::orders::insert(
        &mut conn,
        user_id,
        "pending",
        Money::zero(),
        "1 Main St",
        None,
        "card",
    )
    .await
    .unwrap();

    assert!(
        store::orders::total_for_order(&mut conn, order_id)
            .await
            .unwrap()
            .is_zero()
    );

    let item_id = store::orders::insert_item(&mut conn, order_id, p1, 2, Money::from_cents(1500))
        .await
        .unwrap();
    assert_eq!(
        store::orders::total_for_order(&mut conn, order_id)
            .await
            .unwrap()
            .cents(),
        3000
    );

    store::orders::set_item_quantity(&mut conn, item_id, 1)
        .await
        .unwrap();
    store::orders::delete_item(&mut conn, item_id).await.unwrap();
    assert!(
        store::orders::total_for_order(&mut conn, order_id)
            .await
            .unwrap()
            .is_zero()
    );
}

#[tokio::test]
#[serial_test::serial]
async fn revenue_stats_exclude_cancelled_orders() {
    let pool = get_test_pool().await;
    let mut conn = pool.acquire().await.unwrap();

    let user_id = store::users::insert(&mut conn, "A", "a@example.com", "h", None, None, Role::Customer)
        .await
        .unwrap();

    store::orders::insert(
        &mut conn,
        user_id,
        "pending",
        Money::from_cents(5000),
        "1 Main St",
        None,
        "card",
    )
    .await
    .unwrap();
    store::orders::insert(
        &mut conn,
        user_id,
        "cancelled",
        Money::from_cents(9999),
        "1 Main St",
        None,
        "card",
    )
    .await
    .unwrap();

    let buckets = store::stats::revenue_by_period(&mut conn, StatsPeriod::Year)
        .await
        .unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].revenue.cents(), 5000);
    assert_eq!(buckets[0].order_count, 1);
}

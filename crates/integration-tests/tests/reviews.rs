//! Reviews and rating aggregates against a real database.
//!
//! These tests require a `PostgreSQL` database at `BAZAAR_TEST_DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use bazaar_api::models::{NewOrder, NewOrderItem, NewReview, Order, Product, ShippingAddress, User};
use bazaar_api::services::{
    OrderService, PgOrderService, PgProductService, PgReviewService, ProductService,
    ReviewService, ServiceError,
};
use bazaar_core::{OrderStatus, Rating};
use bazaar_integration_tests::{create_product, create_user, test_pool};
use sqlx::PgPool;

async fn delivered_order(pool: &PgPool, user: &User, product: &Product) -> Order {
    let orders = PgOrderService::new(pool.clone());
    let order = orders
        .place(
            user.clone(),
            NewOrder {
                order_items: vec![NewOrderItem {
                    product: product.id,
                    quantity: 1,
                }],
                shipping_address: ShippingAddress {
                    full_name: "Ada Shopper".to_string(),
                    street_address: "1 Market Street".to_string(),
                    city: "Springfield".to_string(),
                    state: "OR".to_string(),
                    zip_code: "97477".to_string(),
                    phone_number: "555-0100".to_string(),
                },
            },
        )
        .await
        .unwrap();
    orders
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap()
}

fn review(order: &Order, product: &Product, stars: i64) -> NewReview {
    NewReview {
        product_id: product.id,
        order_id: order.id,
        rating: Rating::new(stars).unwrap(),
        comment: "Works as described.".to_string(),
    }
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_reviews_update_product_aggregate() {
    let pool = test_pool().await;
    let product = create_product(&pool, 500, 10).await;
    let reviews = PgReviewService::new(pool.clone());
    let products = PgProductService::new(pool.clone());

    let first = create_user(&pool).await;
    let order = delivered_order(&pool, &first, &product).await;
    reviews
        .create(first, review(&order, &product, 5))
        .await
        .unwrap();

    let second = create_user(&pool).await;
    let order = delivered_order(&pool, &second, &product).await;
    let created = reviews
        .create(second.clone(), review(&order, &product, 2))
        .await
        .unwrap();

    let rated = products.get(product.id).await.unwrap();
    assert_eq!(rated.total_reviews, 2);
    assert!((rated.average_rating - 3.5).abs() < f64::EPSILON);

    reviews.delete(second, created.id).await.unwrap();
    let rated = products.get(product.id).await.unwrap();
    assert_eq!(rated.total_reviews, 1);
    assert!((rated.average_rating - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_second_review_conflicts() {
    let pool = test_pool().await;
    let product = create_product(&pool, 500, 10).await;
    let user = create_user(&pool).await;
    let order = delivered_order(&pool, &user, &product).await;
    let reviews = PgReviewService::new(pool.clone());

    reviews
        .create(user.clone(), review(&order, &product, 4))
        .await
        .unwrap();
    let err = reviews
        .create(user.clone(), review(&order, &product, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));

    let history = PgOrderService::new(pool.clone())
        .list_for_user(user)
        .await
        .unwrap();
    assert!(history.iter().all(|summary| summary.has_reviewed));
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_cannot_review_through_someone_elses_order() {
    let pool = test_pool().await;
    let product = create_product(&pool, 500, 10).await;
    let owner = create_user(&pool).await;
    let order = delivered_order(&pool, &owner, &product).await;
    let stranger = create_user(&pool).await;

    let err = PgReviewService::new(pool.clone())
        .create(stranger, review(&order, &product, 5))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_concurrent_reviews_all_counted() {
    let pool = test_pool().await;
    let product = create_product(&pool, 500, 20).await;
    let reviews = PgReviewService::new(pool.clone());

    let mut pending = Vec::new();
    for stars in 1..=6 {
        let user = create_user(&pool).await;
        let order = delivered_order(&pool, &user, &product).await;
        pending.push((user, review(&order, &product, stars.min(5))));
    }

    let writers: Vec<_> = pending
        .into_iter()
        .map(|(user, new_review)| {
            let reviews = reviews.clone();
            tokio::spawn(async move { reviews.create(user, new_review).await })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap().unwrap();
    }

    let rated = PgProductService::new(pool.clone())
        .get(product.id)
        .await
        .unwrap();
    assert_eq!(rated.total_reviews, 6);
    // 1 + 2 + 3 + 4 + 5 + 5
    assert!((rated.average_rating - 20.0 / 6.0).abs() < 1e-9);
}

//! Checkout and order status against a real database.
//!
//! These tests require a `PostgreSQL` database at `BAZAAR_TEST_DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use bazaar_api::models::{NewOrder, NewOrderItem, ShippingAddress};
use bazaar_api::services::{
    OrderService, PgOrderService, PgProductService, ProductService, ServiceError,
};
use bazaar_core::{OrderId, OrderStatus, Price};
use bazaar_integration_tests::{create_product, create_user, test_pool};

fn shipping() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ada Shopper".to_string(),
        street_address: "1 Market Street".to_string(),
        city: "Springfield".to_string(),
        state: "OR".to_string(),
        zip_code: "97477".to_string(),
        phone_number: "555-0100".to_string(),
    }
}

fn line(product: bazaar_core::ProductId, quantity: i64) -> NewOrderItem {
    NewOrderItem { product, quantity }
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_total_matches_snapshot_lines_and_stock_drops() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let mug = create_product(&pool, 1250, 10).await;
    let towel = create_product(&pool, 400, 3).await;
    let orders = PgOrderService::new(pool.clone());
    let products = PgProductService::new(pool.clone());

    let order = orders
        .place(
            user.clone(),
            NewOrder {
                order_items: vec![line(mug.id, 2), line(towel.id, 3)],
                shipping_address: shipping(),
            },
        )
        .await
        .unwrap();

    let expected: Price = [Price::from_cents(1250).times(2), Price::from_cents(400).times(3)]
        .into_iter()
        .sum();
    assert_eq!(order.total_price, expected);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.order_items.len(), 2);
    assert_eq!(order.user, Some(user.id));

    assert_eq!(products.get(mug.id).await.unwrap().stock, 8);
    assert_eq!(products.get(towel.id).await.unwrap().stock, 0);
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_insufficient_stock_changes_nothing() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let plenty = create_product(&pool, 100, 10).await;
    let scarce = create_product(&pool, 100, 1).await;
    let orders = PgOrderService::new(pool.clone());
    let products = PgProductService::new(pool.clone());

    let err = orders
        .place(
            user.clone(),
            NewOrder {
                order_items: vec![line(plenty.id, 4), line(scarce.id, 2)],
                shipping_address: shipping(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(products.get(plenty.id).await.unwrap().stock, 10);
    assert_eq!(products.get(scarce.id).await.unwrap().stock, 1);
    assert!(orders.list_for_user(user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_snapshot_survives_product_edits() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let mug = create_product(&pool, 1250, 10).await;
    let orders = PgOrderService::new(pool.clone());
    let products = PgProductService::new(pool.clone());

    orders
        .place(
            user.clone(),
            NewOrder {
                order_items: vec![line(mug.id, 1)],
                shipping_address: shipping(),
            },
        )
        .await
        .unwrap();

    let repriced = bazaar_api::models::ProductFields {
        price: Some(Price::from_cents(9900)),
        ..Default::default()
    };
    products.update(mug.id, repriced, None).await.unwrap();

    let history = orders.list_for_user(user).await.unwrap();
    let item = history
        .first()
        .and_then(|summary| summary.order.order_items.first())
        .expect("one order with one item");
    assert_eq!(item.price, Price::from_cents(1250));
    assert_eq!(item.name, mug.name);
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_status_round_trip_stamps_delivery() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let mug = create_product(&pool, 1250, 10).await;
    let orders = PgOrderService::new(pool.clone());

    let order = orders
        .place(
            user,
            NewOrder {
                order_items: vec![line(mug.id, 1)],
                shipping_address: shipping(),
            },
        )
        .await
        .unwrap();

    let delivered = orders
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.delivered_at.is_some());

    // Any transition is allowed, including backwards
    let pending = orders
        .update_status(order.id, OrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(pending.status, OrderStatus::Pending);
    assert!(pending.delivered_at.is_none());
}

#[tokio::test]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_status_of_unknown_order_not_found() {
    let pool = test_pool().await;
    let orders = PgOrderService::new(pool);

    let err = orders
        .update_status(OrderId::generate(), OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("order")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires BAZAAR_TEST_DATABASE_URL"]
async fn test_crossed_concurrent_orders_all_succeed() {
    let pool = test_pool().await;
    let user = create_user(&pool).await;
    let lamp = create_product(&pool, 4500, 100).await;
    let shade = create_product(&pool, 1500, 100).await;
    let orders = PgOrderService::new(pool.clone());

    let checkouts: Vec<_> = (0..20)
        .map(|i| {
            let orders = orders.clone();
            let user = user.clone();
            let order_items = if i % 2 == 0 {
                vec![line(lamp.id, 1), line(shade.id, 1)]
            } else {
                vec![line(shade.id, 1), line(lamp.id, 1)]
            };
            tokio::spawn(async move {
                orders
                    .place(
                        user,
                        NewOrder {
                            order_items,
                            shipping_address: shipping(),
                        },
                    )
                    .await
            })
        })
        .collect();
    for checkout in checkouts {
        checkout.await.unwrap().unwrap();
    }

    let products = PgProductService::new(pool.clone());
    assert_eq!(products.get(lamp.id).await.unwrap().stock, 80);
    assert_eq!(products.get(shade.id).await.unwrap().stock, 80);
}

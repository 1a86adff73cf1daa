//! Handler tests over mocked services.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use bazaar_core::{Email, OrderId, OrderStatus, Price, ProductId, UserId};

use crate::config::ApiConfig;
use crate::models::{Order, Product, ShippingAddress, User};
use crate::services::addresses::MockAddressService;
use crate::services::auth::MockAuthenticator;
use crate::services::catalog::MockProductService;
use crate::services::jobs::{SIGNATURE_HEADER, sign};
use crate::services::orders::MockOrderService;
use crate::services::reviews::MockReviewService;
use crate::services::users::MockUserService;
use crate::services::{IdentityError, ServiceError, Services};
use crate::state::AppState;
use crate::storage::MockImageStore;

const ADMIN_TOKEN: &str = "admin-token";
const SHOPPER_TOKEN: &str = "shopper-token";
const BOUNDARY: &str = "bazaar-test-boundary";

fn user(clerk_id: &str, email: &str) -> User {
    let now = Utc::now();
    User {
        id: UserId::generate(),
        clerk_id: clerk_id.to_string(),
        email: Email::parse(email).unwrap(),
        name: "Test User".to_string(),
        image_url: String::new(),
        created_at: now,
        updated_at: now,
    }
}

fn product(images: Vec<String>) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::generate(),
        name: "Enamel Mug".to_string(),
        category: "Kitchen".to_string(),
        description: "Holds coffee.".to_string(),
        price: Price::from_cents(1250),
        stock: 40,
        images,
        average_rating: 0.0,
        total_reviews: 0,
        created_at: now,
        updated_at: now,
    }
}

fn order(id: OrderId, status: OrderStatus) -> Order {
    let now = Utc::now();
    Order {
        id,
        user: Some(UserId::generate()),
        clerk_id: "user_shopper".to_string(),
        order_items: Vec::new(),
        shipping_address: ShippingAddress::default(),
        total_price: Price::ZERO,
        status,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Mocks for every service. Any call without a matching expectation panics,
/// which is how tests assert a service was never reached.
struct Harness {
    auth: MockAuthenticator,
    products: MockProductService,
    orders: MockOrderService,
    addresses: MockAddressService,
    reviews: MockReviewService,
    users: MockUserService,
    images: MockImageStore,
}

impl Harness {
    fn new() -> Self {
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate().returning(|token| match token {
            ADMIN_TOKEN => Ok(user("user_admin", "admin@bazaar.test")),
            SHOPPER_TOKEN => Ok(user("user_shopper", "shopper@bazaar.test")),
            _ => Err(IdentityError::UnknownUser),
        });

        Self {
            auth,
            products: MockProductService::new(),
            orders: MockOrderService::new(),
            addresses: MockAddressService::new(),
            reviews: MockReviewService::new(),
            users: MockUserService::new(),
            images: MockImageStore::new(),
        }
    }

    fn app(self) -> Router {
        let services = Services {
            auth: Arc::new(self.auth),
            products: Arc::new(self.products),
            orders: Arc::new(self.orders),
            addresses: Arc::new(self.addresses),
            reviews: Arc::new(self.reviews),
            users: Arc::new(self.users),
            images: Arc::new(self.images),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://bazaar@localhost/bazaar")
            .unwrap();
        let state = AppState::with_services(ApiConfig::for_tests(), pool, services);
        super::routes().with_state(state)
    }
}

fn multipart_body(fields: &[(&str, &str)], images: usize) -> Body {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for i in 0..images {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{i}.png\"\r\nContent-Type: image/png\r\n\r\npng-bytes-{i}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Body::from(body)
}

const PRODUCT_FIELDS: &[(&str, &str)] = &[
    ("name", "Enamel Mug"),
    ("category", "Kitchen"),
    ("description", "Holds coffee."),
    ("price", "12.50"),
    ("stock", "40"),
];

fn multipart_request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_is_public() {
    let response = Harness::new()
        .app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_product_without_images_rejected() {
    let app = Harness::new().app();
    let request = multipart_request("POST", "/api/products", multipart_body(PRODUCT_FIELDS, 0));

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "at least one image is required");
}

#[tokio::test]
async fn test_create_product_with_four_images_rejected() {
    let app = Harness::new().app();
    let request = multipart_request(
        "POST",
        "/api/admin/products",
        multipart_body(PRODUCT_FIELDS, 4),
    );

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "maximum 3 images allowed, got 4");
}

#[tokio::test]
async fn test_update_product_with_four_images_rejected() {
    let app = Harness::new().app();
    let uri = format!("/api/products/{}", ProductId::generate());
    let request = multipart_request("PUT", &uri, multipart_body(&[("price", "3")], 4));

    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_stores_images_then_saves() {
    let mut harness = Harness::new();
    harness
        .images
        .expect_save()
        .times(2)
        .returning(|upload| Ok(format!("http://127.0.0.1:3000/uploads/{}.png", upload.data.len())));
    harness
        .products
        .expect_create()
        .withf(|fields, images| fields.is_complete() && images.len() == 2)
        .times(1)
        .returning(|_, images| Ok(product(images)));

    let request = multipart_request("POST", "/api/products", multipart_body(PRODUCT_FIELDS, 2));
    let (status, body) = send(harness.app(), request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Enamel Mug");
    assert_eq!(body["price"], 12.5);
    assert_eq!(body["images"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_create_removes_stored_images() {
    let mut harness = Harness::new();
    harness
        .images
        .expect_save()
        .times(1)
        .returning(|_| Ok("http://127.0.0.1:3000/uploads/a.png".to_string()));
    harness
        .products
        .expect_create()
        .returning(|_, _| Err(ServiceError::Validation("name is required".into())));
    harness
        .images
        .expect_remove()
        .withf(|url: &str| url == "http://127.0.0.1:3000/uploads/a.png")
        .times(1)
        .returning(|_| Ok(()));

    let request = multipart_request("POST", "/api/products", multipart_body(PRODUCT_FIELDS, 1));
    let (status, _) = send(harness.app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_product_removes_its_images() {
    let mut harness = Harness::new();
    harness
        .products
        .expect_delete()
        .times(1)
        .returning(|_| Ok(product(vec!["http://127.0.0.1:3000/uploads/a.png".into()])));
    harness
        .images
        .expect_remove()
        .times(1)
        .returning(|_| Err(crate::storage::StorageError::ForeignUrl("gone".into())));

    let uri = format!("/api/products/{}", ProductId::generate());
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(harness.app(), request).await;

    // Storage cleanup failures are logged, not surfaced
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");
}

#[tokio::test]
async fn test_invalid_status_rejected_before_storage() {
    let app = Harness::new().app();
    let uri = format!("/api/admin/orders/{}/status", OrderId::generate());
    let request = json_request("PATCH", &uri, Some(ADMIN_TOKEN), &json!({ "status": "cancelled" }));

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("'cancelled'"));
}

#[tokio::test]
async fn test_valid_status_updates_order() {
    let id = OrderId::generate();
    let mut harness = Harness::new();
    harness
        .orders
        .expect_update_status()
        .withf(move |order_id, status| *order_id == id && *status == OrderStatus::Shipped)
        .times(1)
        .returning(|id, status| Ok(order(id, status)));

    let uri = format!("/api/admin/orders/{id}/status");
    let request = json_request("PATCH", &uri, Some(ADMIN_TOKEN), &json!({ "status": "shipped" }));
    let (status, body) = send(harness.app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "shipped");
    assert_eq!(body["order"]["_id"], id.to_string());
}

#[tokio::test]
async fn test_non_admin_forbidden_on_admin_routes() {
    let app = Harness::new().app();
    let request = Request::builder()
        .uri("/api/admin/stats")
        .header(header::AUTHORIZATION, format!("Bearer {SHOPPER_TOKEN}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden - admin access only");
}

#[tokio::test]
async fn test_missing_token_unauthorized() {
    let app = Harness::new().app();
    let request = Request::builder()
        .uri("/api/orders")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized - no token provided");
}

#[tokio::test]
async fn test_unknown_user_unauthorized() {
    let app = Harness::new().app();
    let request = Request::builder()
        .uri("/api/users/addresses")
        .header(header::AUTHORIZATION, "Bearer someone-else")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_address_list_wrapped() {
    let mut harness = Harness::new();
    harness
        .addresses
        .expect_list()
        .times(1)
        .returning(|_| Ok(Vec::new()));

    let request = Request::builder()
        .uri("/api/users/addresses")
        .header(header::AUTHORIZATION, format!("Bearer {SHOPPER_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(harness.app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "addresses": [] }));
}

#[tokio::test]
async fn test_malformed_id_is_json_bad_request() {
    let app = Harness::new().app();
    let request = Request::builder()
        .uri("/api/products/not-a-uuid")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_database_errors_do_not_leak() {
    let mut harness = Harness::new();
    harness.products.expect_list().returning(|| {
        Err(ServiceError::Repository(
            crate::db::RepositoryError::DataCorruption("shop.product row 7".into()),
        ))
    });

    let request = Request::builder()
        .uri("/api/products")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(harness.app(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

fn signed_job(body: &Value, signed_at: i64) -> Request<Body> {
    let raw = body.to_string();
    let signature = sign(
        &ApiConfig::for_tests().inngest_signing_key,
        raw.as_bytes(),
        signed_at,
    )
    .unwrap();
    Request::builder()
        .method("POST")
        .uri("/api/inngest")
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(raw))
        .unwrap()
}

#[tokio::test]
async fn test_job_user_deleted_evicts_cache() {
    let mut harness = Harness::new();
    harness
        .users
        .expect_delete_by_clerk_id()
        .withf(|clerk_id| clerk_id == "user_gone")
        .times(1)
        .returning(|_| Ok(true));
    harness
        .auth
        .expect_forget()
        .withf(|clerk_id: &str| clerk_id == "user_gone")
        .times(1)
        .returning(|_| ());

    let event = json!({ "name": "clerk/user.deleted", "data": { "id": "user_gone" } });
    let (status, body) = send(harness.app(), signed_job(&event, Utc::now().timestamp())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_job_unknown_event_ignored() {
    let app = Harness::new().app();
    let event = json!({ "name": "clerk/session.created", "data": {} });

    let (status, body) = send(app, signed_job(&event, Utc::now().timestamp())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
}

#[tokio::test]
async fn test_job_stale_signature_rejected() {
    let app = Harness::new().app();
    let event = json!({ "name": "clerk/user.deleted", "data": { "id": "user_gone" } });

    let (status, _) = send(app, signed_job(&event, Utc::now().timestamp() - 3600)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_job_unsigned_rejected() {
    let app = Harness::new().app();
    let request = json_request(
        "POST",
        "/api/inngest",
        None,
        &json!({ "name": "clerk/user.deleted", "data": { "id": "user_gone" } }),
    );

    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

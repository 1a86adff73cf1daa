//! Order service.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::{OrderId, OrderStatus};

use super::{ServiceError, not_found};
use crate::db::{OrderRepository, PlaceOrderError, ReviewRepository};
use crate::models::{NewOrder, Order, OrderSummary, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Validate and place an order for `user`, decrementing stock.
    async fn place(&self, user: User, order: NewOrder) -> Result<Order, ServiceError>;

    /// The user's orders, newest first, flagged when fully reviewed.
    async fn list_for_user(&self, user: User) -> Result<Vec<OrderSummary>, ServiceError>;

    /// Every order, newest first.
    async fn list_all(&self) -> Result<Vec<Order>, ServiceError>;

    /// Set an order's status.
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct PgOrderService {
    pool: PgPool,
}

impl PgOrderService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderService for PgOrderService {
    #[tracing::instrument(skip(self, user, order), fields(user_id = %user.id))]
    async fn place(&self, user: User, order: NewOrder) -> Result<Order, ServiceError> {
        let request = order.validate()?;

        let order = OrderRepository::new(&self.pool)
            .place(&user, &request)
            .await
            .map_err(|e| match e {
                PlaceOrderError::UnknownProduct(_) => ServiceError::NotFound("product"),
                e @ PlaceOrderError::InsufficientStock { .. } => {
                    ServiceError::Conflict(e.to_string())
                }
                PlaceOrderError::Repository(e) => e.into(),
            })?;

        tracing::info!(
            order_id = %order.id,
            total = %order.total_price,
            items = order.order_items.len(),
            "Order placed"
        );
        Ok(order)
    }

    async fn list_for_user(&self, user: User) -> Result<Vec<OrderSummary>, ServiceError> {
        let orders = OrderRepository::new(&self.pool)
            .list_for_user(user.id)
            .await?;
        let reviewed = ReviewRepository::new(&self.pool)
            .reviewed_products(user.id)
            .await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let has_reviewed = order.product_ids().all(|id| reviewed.contains(&id));
                OrderSummary {
                    order,
                    has_reviewed,
                }
            })
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(OrderRepository::new(&self.pool).list_all().await?)
    }

    #[tracing::instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let order = OrderRepository::new(&self.pool)
            .set_status(id, status)
            .await
            .map_err(not_found("order"))?;

        tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
        Ok(order)
    }
}

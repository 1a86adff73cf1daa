//! Order repository for database operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use bazaar_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use super::{RepositoryError, count_from_db, count_to_db};
use crate::models::{Order, OrderItem, ShippingAddress, User, ValidatedOrder};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    clerk_id: String,
    ship_full_name: String,
    ship_street: String,
    ship_city: String,
    ship_state: String,
    ship_zip_code: String,
    ship_phone: String,
    total_price: Price,
    status: OrderStatus,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user: self.user_id,
            clerk_id: self.clerk_id,
            order_items,
            shipping_address: ShippingAddress {
                full_name: self.ship_full_name,
                street_address: self.ship_street,
                city: self.ship_city,
                state: self.ship_state,
                zip_code: self.ship_zip_code,
                phone_number: self.ship_phone,
            },
            total_price: self.total_price,
            status: self.status,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    name: String,
    price: Price,
    quantity: i32,
    image: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product: row.product_id,
            name: row.name,
            price: row.price,
            quantity: count_from_db("quantity", row.quantity)?,
            image: row.image,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StockRow {
    name: String,
    price: Price,
    stock: i32,
    images: Vec<String>,
}

const ORDER_COLUMNS: &str = "id, user_id, clerk_id, ship_full_name, ship_street, ship_city, \
     ship_state, ship_zip_code, ship_phone, total_price, status, delivered_at, created_at, \
     updated_at";

/// Why an order could not be placed.
#[derive(Debug, thiserror::Error)]
pub enum PlaceOrderError {
    /// A requested product does not exist.
    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    /// Not enough stock to fill a line.
    #[error("insufficient stock for {name}: {available} available, {requested} requested")]
    InsufficientStock {
        product: ProductId,
        name: String,
        available: u32,
        requested: u32,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order, decrementing stock for every line.
    ///
    /// Runs in one transaction holding row locks on the products, so either
    /// every line is filled or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::UnknownProduct` or
    /// `PlaceOrderError::InsufficientStock` when a line cannot be filled.
    pub async fn place(
        &self,
        user: &User,
        request: &ValidatedOrder,
    ) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent checkouts over the same products must lock them in the
        // same order or they deadlock.
        sqlx::query("SELECT id FROM shop.product WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(lock_order(&request.items))
            .execute(&mut *tx)
            .await?;

        let mut items = Vec::with_capacity(request.items.len());
        for &(product_id, quantity) in &request.items {
            let product = sqlx::query_as::<_, StockRow>(
                "SELECT name, price, stock, images FROM shop.product WHERE id = $1 FOR UPDATE",
            )
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(PlaceOrderError::UnknownProduct(product_id))?;

            let available = count_from_db("stock", product.stock)?;
            if available < quantity {
                return Err(PlaceOrderError::InsufficientStock {
                    product: product_id,
                    name: product.name,
                    available,
                    requested: quantity,
                });
            }

            sqlx::query(
                "UPDATE shop.product SET stock = stock - $2, updated_at = now() WHERE id = $1",
            )
            .bind(product_id)
            .bind(count_to_db("quantity", quantity)?)
            .execute(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: OrderItemId::generate(),
                product: Some(product_id),
                name: product.name,
                price: product.price,
                quantity,
                image: product.images.into_iter().next().unwrap_or_default(),
            });
        }

        let total = Order::items_total(&items);
        let shipping = &request.shipping_address;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.order
                (id, user_id, clerk_id, ship_full_name, ship_street, ship_city, ship_state,
                 ship_zip_code, ship_phone, total_price, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(OrderId::generate())
        .bind(user.id)
        .bind(&user.clerk_id)
        .bind(&shipping.full_name)
        .bind(&shipping.street_address)
        .bind(&shipping.city)
        .bind(&shipping.state)
        .bind(&shipping.zip_code)
        .bind(&shipping.phone_number)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO shop.order_item
                    (id, order_id, position, product_id, name, price, quantity, image)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(item.id)
            .bind(row.id)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(item.product)
            .bind(&item.name)
            .bind(item.price)
            .bind(count_to_db("quantity", item.quantity)?)
            .bind(&item.image)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(row.into_order(items))
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(with_items(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        with_items(&mut conn, rows).await
    }

    /// List every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order ORDER BY created_at DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;

        with_items(&mut conn, rows).await
    }

    /// Set an order's status.
    ///
    /// `delivered_at` is stamped when the status becomes delivered and
    /// cleared otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.order
               SET status = $2,
                   delivered_at = CASE
                       WHEN $2 = 'delivered' THEN COALESCE(delivered_at, now())
                       ELSE NULL
                   END,
                   updated_at = now()
             WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        with_items(&mut conn, vec![row])
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }
}

/// Attach line items to order rows, preserving row order.
/// Distinct product ids of an order, sorted.
fn lock_order(items: &[(ProductId, u32)]) -> Vec<uuid::Uuid> {
    let mut ids: Vec<uuid::Uuid> = items.iter().map(|(id, _)| id.as_uuid()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn with_items(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<Order>, RepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id.as_uuid()).collect();
    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, product_id, name, price, quantity, image
          FROM shop.order_item
         WHERE order_id = ANY($1)
         ORDER BY order_id, position
        ",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in item_rows {
        let order_id = item.order_id;
        items.entry(order_id).or_default().push(item.try_into()?);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            row.into_order(order_items)
        })
        .collect())
}

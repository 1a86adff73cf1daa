//! Aggregate queries for the admin dashboard.

use sqlx::PgPool;

use bazaar_core::Price;

use super::RepositoryError;
use crate::models::DashboardStats;

#[derive(sqlx::FromRow)]
struct StatsRow {
    total_revenue: Price,
    total_orders: i64,
    total_customers: i64,
    total_products: i64,
}

/// Repository for dashboard aggregates.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Revenue and entity counts across the whole store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                (SELECT COALESCE(SUM(total_price), 0) FROM shop.order) AS total_revenue,
                (SELECT COUNT(*) FROM shop.order) AS total_orders,
                (SELECT COUNT(*) FROM shop.user) AS total_customers,
                (SELECT COUNT(*) FROM shop.product) AS total_products
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let count = |field: &str, value: i64| {
            u64::try_from(value)
                .map_err(|_| RepositoryError::DataCorruption(format!("negative {field}")))
        };

        Ok(DashboardStats {
            total_revenue: row.total_revenue,
            total_orders: count("total_orders", row.total_orders)?,
            total_customers: count("total_customers", row.total_customers)?,
            total_products: count("total_products", row.total_products)?,
        })
    }
}

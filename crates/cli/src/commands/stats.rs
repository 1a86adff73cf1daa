//! Dashboard statistics command.

use tracing::info;

use bazaar_api::db::{self, StatsRepository};

/// Print the admin dashboard totals.
///
/// # Errors
///
/// Returns an error if the database connection or query fails.
pub async fn dashboard() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;

    let stats = StatsRepository::new(&pool).dashboard().await?;

    info!("Dashboard Statistics");
    info!("====================");
    info!("Total revenue:   {}", stats.total_revenue);
    info!("Total orders:    {}", stats.total_orders);
    info!("Total customers: {}", stats.total_customers);
    info!("Total products:  {}", stats.total_products);

    Ok(())
}

//! Admin dashboard figures.

use serde::Serialize;

use bazaar_core::Price;

/// Totals shown on the admin home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: Price,
    pub total_orders: u64,
    pub total_customers: u64,
    pub total_products: u64,
}

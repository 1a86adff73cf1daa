//! Orders and their snapshot line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use super::{ValidationError, required};

/// Where an order ships, copied from the shopper's address at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone_number: String,
}

impl ShippingAddress {
    /// Trim every field and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns the first blank field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            full_name: required("shippingAddress.fullName", &self.full_name)?,
            street_address: required("shippingAddress.streetAddress", &self.street_address)?,
            city: required("shippingAddress.city", &self.city)?,
            state: required("shippingAddress.state", &self.state)?,
            zip_code: required("shippingAddress.zipCode", &self.zip_code)?,
            phone_number: required("shippingAddress.phoneNumber", &self.phone_number)?,
        })
    }
}

/// One line of an order.
///
/// Name, price and image are copied from the product when the order is
/// placed so later catalog edits do not rewrite history. `product` becomes
/// `None` once the product is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "_id")]
    pub id: OrderItemId,
    pub product: Option<ProductId>,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub image: String,
}

impl OrderItem {
    /// Snapshot price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A placed order (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// Owner, `None` after the account was deleted.
    pub user: Option<UserId>,
    pub clerk_id: String,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_price: Price,
    pub status: OrderStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of the line totals.
    #[must_use]
    pub fn items_total(items: &[OrderItem]) -> Price {
        items.iter().map(OrderItem::line_total).sum()
    }

    /// Products in this order that still exist in the catalog.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.order_items.iter().filter_map(|item| item.product)
    }
}

/// An order as listed to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    /// Whether the shopper reviewed every product in the order.
    pub has_reviewed: bool,
}

/// Requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewOrderItem {
    pub product: ProductId,
    pub quantity: i64,
}

/// Checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
}

impl NewOrder {
    /// Check the request before any stock is touched.
    ///
    /// # Errors
    ///
    /// Rejects empty orders, quantities below one, and blank shipping fields.
    pub fn validate(self) -> Result<ValidatedOrder, ValidationError> {
        if self.order_items.is_empty() {
            return Err(ValidationError::new("order must contain at least one item"));
        }
        let items = self
            .order_items
            .into_iter()
            .map(|item| {
                i32::try_from(item.quantity)
                    .ok()
                    .and_then(|q| u32::try_from(q).ok())
                    .filter(|q| *q >= 1)
                    .map(|quantity| (item.product, quantity))
                    .ok_or_else(|| ValidationError::new("quantity must be at least 1"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedOrder {
            items,
            shipping_address: self.shipping_address.validate()?,
        })
    }
}

/// A checkout request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    /// Product and quantity, in request order.
    pub items: Vec<(ProductId, u32)>,
    pub shipping_address: ShippingAddress,
}

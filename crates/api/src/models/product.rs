//! Catalog products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Price, ProductId};

use super::{ValidationError, required};

/// A catalog product (domain type).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    /// Public image URLs, first one is the cover.
    pub images: Vec<String>,
    pub average_rating: f64,
    pub total_reviews: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text fields of the product form, exactly as received.
#[derive(Debug, Clone, Default)]
pub struct ProductFormFields {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
}

/// Validated product fields.
///
/// On create every field is set. On update, `None` leaves the stored value
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductFields {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<u32>,
}

impl ProductFormFields {
    /// Validate a form for a new product; every field is required.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed field.
    pub fn for_create(self) -> Result<ProductFields, ValidationError> {
        let text =
            |field: &str, value: Option<String>| required(field, value.as_deref().unwrap_or_default());
        Ok(ProductFields {
            name: Some(text("name", self.name)?),
            category: Some(text("category", self.category)?),
            description: Some(text("description", self.description)?),
            price: Some(parse_price(&text("price", self.price)?)?),
            stock: Some(parse_stock(&text("stock", self.stock)?)?),
        })
    }

    /// Validate a form for an update; blank or absent fields are left alone.
    ///
    /// # Errors
    ///
    /// Returns the first malformed price or stock.
    pub fn for_update(self) -> Result<ProductFields, ValidationError> {
        Ok(ProductFields {
            name: present(self.name),
            category: present(self.category),
            description: present(self.description),
            price: present(self.price).as_deref().map(parse_price).transpose()?,
            stock: present(self.stock).as_deref().map(parse_stock).transpose()?,
        })
    }
}

impl ProductFields {
    /// Whether every field is set, as a new product requires.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.category.is_some()
            && self.description.is_some()
            && self.price.is_some()
            && self.stock.is_some()
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_price(raw: &str) -> Result<Price, ValidationError> {
    Price::parse(raw).map_err(|e| ValidationError(e.to_string()))
}

fn parse_stock(raw: &str) -> Result<u32, ValidationError> {
    let stock = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| ValidationError::new("stock must be a whole number"))?;
    u32::try_from(stock).map_err(|_| ValidationError::new("stock cannot be negative"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductFormFields {
        ProductFormFields {
            name: Some("Enamel Mug".into()),
            category: Some("Kitchen".into()),
            description: Some("Holds coffee.".into()),
            price: Some("12.50".into()),
            stock: Some("40".into()),
        }
    }

    #[test]
    fn test_create_parses_every_field() {
        let fields = form().for_create().unwrap();
        assert!(fields.is_complete());
        assert_eq!(fields.price, Some(Price::from_cents(1250)));
        assert_eq!(fields.stock, Some(40));
    }

    #[test]
    fn test_create_requires_name() {
        let mut raw = form();
        raw.name = Some("   ".into());
        assert_eq!(raw.for_create().unwrap_err().to_string(), "name is required");
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let mut raw = form();
        raw.price = Some("-4".into());
        assert!(raw.for_create().is_err());

        let mut raw = form();
        raw.stock = Some("-1".into());
        assert_eq!(
            raw.for_create().unwrap_err().to_string(),
            "stock cannot be negative"
        );

        let mut raw = form();
        raw.stock = Some("2.5".into());
        assert_eq!(
            raw.for_create().unwrap_err().to_string(),
            "stock must be a whole number"
        );
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let raw = ProductFormFields {
            price: Some("3".into()),
            name: Some(String::new()),
            ..Default::default()
        };
        let fields = raw.for_update().unwrap();
        assert_eq!(fields.name, None);
        assert_eq!(fields.price, Some(Price::from_cents(300)));
        assert!(!fields.is_complete());
    }
}

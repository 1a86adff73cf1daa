//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Enamel Mug
//!     category: Kitchen
//!     description: Holds coffee.
//!     price: 12.50
//!     stock: 40
//!     images:
//!       - https://cdn.example.com/mug.png
//! ```
//!
//! Every product is validated before the database is touched, and the
//! inserts share one transaction: a file either seeds completely or not at
//! all.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use bazaar_api::db;
use bazaar_api::models::{ProductFields, ProductFormFields};
use bazaar_core::check_new_product_images;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub products: Vec<SeedProduct>,
}

/// Numbers may be written bare or quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_yaml::Number),
    Text(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// One product entry.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Scalar,
    pub stock: Scalar,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A product that passed validation.
#[derive(Debug)]
pub struct ValidProduct {
    pub fields: ProductFields,
    pub images: Vec<String>,
}

/// Validate every entry, returning all failures labelled by entry.
///
/// # Errors
///
/// Returns one message per invalid entry.
pub fn validate(file: SeedFile) -> Result<Vec<ValidProduct>, Vec<String>> {
    let mut valid = Vec::with_capacity(file.products.len());
    let mut errors = Vec::new();

    for (index, product) in file.products.into_iter().enumerate() {
        let label = format!("#{} ({})", index + 1, product.name.trim());

        if let Err(e) = check_new_product_images(product.images.len()) {
            errors.push(format!("{label}: {e}"));
            continue;
        }

        let form = ProductFormFields {
            name: Some(product.name),
            category: Some(product.category),
            description: Some(product.description),
            price: Some(product.price.into_string()),
            stock: Some(product.stock.into_string()),
        };
        match form.for_create() {
            Ok(fields) => valid.push(ValidProduct {
                fields,
                images: product.images,
            }),
            Err(e) => errors.push(format!("{label}: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(valid)
    } else {
        Err(errors)
    }
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or an insert fails.
pub async fn products(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;
    info!(products = file.products.len(), "Parsed seed file");

    let products = match validate(file) {
        Ok(products) => products,
        Err(errors) => {
            error!("Seed file validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    if dry_run {
        info!(products = products.len(), "Dry run, nothing inserted");
        return Ok(());
    }

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let batch: Vec<_> = products
        .into_iter()
        .map(|product| (product.fields, product.images))
        .collect();
    let created = db::ProductRepository::new(&pool).create_all(&batch).await?;
    for product in &created {
        info!(product_id = %product.id, name = %product.name, "Inserted product");
    }

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> SeedFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_accepts_bare_and_quoted_numbers() {
        let file = parse(
            r#"
products:
  - name: Enamel Mug
    category: Kitchen
    description: Holds coffee.
    price: 12.50
    stock: 40
    images: [https://cdn.example.com/mug.png]
  - name: Tea Towel
    category: Kitchen
    description: Dries things.
    price: "4"
    stock: "7"
    images: [https://cdn.example.com/towel.png]
"#,
        );

        let products = validate(file).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].fields.stock, Some(7));
    }

    #[test]
    fn test_reports_every_invalid_entry() {
        let file = parse(
            r#"
products:
  - name: No Images
    category: Kitchen
    description: Missing pictures.
    price: 1
    stock: 1
  - name: Negative Stock
    category: Kitchen
    description: Impossible.
    price: 1
    stock: -3
    images: [https://cdn.example.com/a.png]
"#,
        );

        let errors = validate(file).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("at least one image is required"));
        assert!(errors[1].contains("stock cannot be negative"));
    }
}

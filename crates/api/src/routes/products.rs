//! Product route handlers.
//!
//! Reads are public. Writes take a multipart form with the text fields and
//! up to three `images` file parts, and are mounted behind the admin guard
//! both under `/api/products` and `/api/admin/products`.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use bazaar_core::{ProductId, check_new_product_images, check_replacement_images};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductFormFields};
use crate::state::AppState;
use crate::storage::{ImageUpload, remove_best_effort};

use super::ApiPath;

/// A parsed product form: text fields plus image parts in submission order.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub fields: ProductFormFields,
    pub images: Vec<ImageUpload>,
}

impl ProductForm {
    /// Read every part of a multipart product form.
    ///
    /// Unknown text parts are ignored. Empty file parts (a file input left
    /// blank) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` when the body limit is hit and `BadRequest`
    /// for any other malformed body.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "images" {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if !data.is_empty() {
                    form.images.push(ImageUpload { content_type, data });
                }
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            let slot = match name.as_str() {
                "name" => &mut form.fields.name,
                "category" => &mut form.fields.category,
                "description" => &mut form.fields.description,
                "price" => &mut form.fields.price,
                "stock" => &mut form.fields.stock,
                _ => continue,
            };
            *slot = Some(value);
        }

        Ok(form)
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Store every upload, returning their URLs.
///
/// On failure, images already stored by this call are removed again.
async fn store_images(state: &AppState, uploads: Vec<ImageUpload>) -> Result<Vec<String>> {
    let store = state.services().images.as_ref();
    let mut urls = Vec::with_capacity(uploads.len());

    for upload in uploads {
        match store.save(upload).await {
            Ok(url) => urls.push(url),
            Err(err) => {
                remove_best_effort(store, &urls).await;
                return Err(err.into());
            }
        }
    }

    Ok(urls)
}

/// List all products, newest first.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.services().products.list().await?;
    Ok(Json(products))
}

/// Show a single product.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    let product = state.services().products.get(id).await?;
    Ok(Json(product))
}

/// Create a product from a multipart form.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = ProductForm::read(multipart).await?;

    check_new_product_images(form.images.len())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let fields = form
        .fields
        .for_create()
        .map_err(|e| AppError::BadRequest(e.0))?;

    let urls = store_images(&state, form.images).await?;

    match state.services().products.create(fields, urls.clone()).await {
        Ok(product) => Ok((StatusCode::CREATED, Json(product))),
        Err(err) => {
            remove_best_effort(state.services().images.as_ref(), &urls).await;
            Err(err.into())
        }
    }
}

/// Update a product from a multipart form.
///
/// Blank fields keep their stored value. Submitted images replace the
/// current set; the replaced files are removed afterwards.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let form = ProductForm::read(multipart).await?;

    check_replacement_images(form.images.len())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let fields = form
        .fields
        .for_update()
        .map_err(|e| AppError::BadRequest(e.0))?;

    let images = if form.images.is_empty() {
        None
    } else {
        Some(store_images(&state, form.images).await?)
    };

    let store = state.services().images.as_ref();
    match state
        .services()
        .products
        .update(id, fields, images.clone())
        .await
    {
        Ok(update) => {
            remove_best_effort(store, &update.replaced_images).await;
            Ok(Json(update.product))
        }
        Err(err) => {
            if let Some(urls) = &images {
                remove_best_effort(store, urls).await;
            }
            Err(err.into())
        }
    }
}

/// Delete a product and, best-effort, its stored images.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.services().products.delete(id).await?;
    remove_best_effort(state.services().images.as_ref(), &product.images).await;

    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

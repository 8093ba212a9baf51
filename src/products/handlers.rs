use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use bytes::Bytes;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    error::ApiError,
    products::{
        dto::{ListProductsQuery, SortOrder},
        repo::{ImageKind, NewProduct, Product, ProductCategory, ProductUpdate},
    },
    state::AppState,
};

const FEATURED_LIMIT: i64 = 8;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/featured", get(featured_products))
        .route("/products/category/:category", get(products_by_category))
        .route("/products/:id", get(get_product))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product))
        .route("/products/:id", delete(delete_product))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB uploads
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let category = match q.category.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<ProductCategory>()
                .map_err(|_| ApiError::Validation(format!("Unknown category '{raw}'")))?,
        ),
    };
    let sort = SortOrder::parse(q.sort.as_deref());
    let products = Product::list(&state.db, category, q.search.as_deref(), sort).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn featured_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = Product::featured(&state.db, FEATURED_LIMIT).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let category = category
        .parse::<ProductCategory>()
        .map_err(|_| ApiError::Validation(format!("Unknown category '{category}'")))?;
    let products = Product::by_category(&state.db, category).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(Json(json!({ "success": true, "data": product })))
}

#[instrument(skip(state, mp))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let form = ProductForm::read(mp).await?;

    let name = required_text(form.name.as_deref(), "name")?;
    let price = form
        .price
        .ok_or_else(|| ApiError::Validation("price is required".into()))?;
    let category = form
        .category
        .ok_or_else(|| ApiError::Validation("category is required".into()))?;
    let description = required_text(form.description.as_deref(), "description")?;

    let (image, image_kind) = match form.image(&state).await? {
        Some(pair) => pair,
        None => {
            return Err(ApiError::Validation(
                "Product image is required (either URL or file upload)".into(),
            ))
        }
    };

    let product = Product::create(
        &state.db,
        &NewProduct {
            name,
            price,
            category,
            description,
            image,
            image_kind,
            stock: form.stock.unwrap_or(0),
            featured: form.featured.unwrap_or(false),
        },
    )
    .await?;

    info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, mp))]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<Product>, ApiError> {
    if Product::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    let form = ProductForm::read(mp).await?;
    let update = ProductUpdate {
        name: form.name.clone(),
        price: form.price,
        category: form.category,
        description: form.description.clone(),
        image: form.image(&state).await?,
        stock: form.stock,
        featured: form.featured,
    };

    let product = Product::update(&state.db, id, &update).await?;
    info!(product_id = %product.id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !Product::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    info!(product_id = %id, "product deleted");
    Ok(Json(json!({ "success": true, "message": "Product deleted successfully" })))
}

/// Multipart product form: scalar fields plus either an uploaded `image` file
/// or an HTTPS `image_url`.
#[derive(Default)]
struct ProductForm {
    name: Option<String>,
    price: Option<Decimal>,
    category: Option<ProductCategory>,
    description: Option<String>,
    stock: Option<i32>,
    featured: Option<bool>,
    image_url: Option<String>,
    upload: Option<(Option<String>, Bytes)>,
}

impl ProductForm {
    async fn read(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
        {
            let name = field.name().map(|s| s.to_string());
            match name.as_deref() {
                Some("name") => form.name = Some(text(field).await?),
                Some("price") => {
                    let raw = text(field).await?;
                    let price = raw
                        .trim()
                        .parse::<Decimal>()
                        .map_err(|_| ApiError::Validation("Invalid price".into()))?;
                    if price < Decimal::ZERO {
                        return Err(ApiError::Validation("Price must be non-negative".into()));
                    }
                    form.price = Some(price);
                }
                Some("category") => {
                    let raw = text(field).await?;
                    form.category = Some(
                        raw.parse::<ProductCategory>()
                            .map_err(|_| ApiError::Validation(format!("Unknown category '{raw}'")))?,
                    );
                }
                Some("description") => form.description = Some(text(field).await?),
                Some("stock") => {
                    let raw = text(field).await?;
                    let stock = raw
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| ApiError::Validation("Invalid stock".into()))?;
                    if stock < 0 {
                        return Err(ApiError::Validation("Stock must be non-negative".into()));
                    }
                    form.stock = Some(stock);
                }
                Some("featured") => form.featured = Some(text(field).await? == "true"),
                Some("image_url") => form.image_url = Some(text(field).await?),
                Some("image") => {
                    let extension = field
                        .file_name()
                        .and_then(|f| f.rsplit_once('.').map(|(_, ext)| ext.to_string()));
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Validation(format!("Malformed upload: {e}")))?;
                    form.upload = Some((extension, data));
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// Resolves the image source; a URL takes precedence over an uploaded
    /// file. `None` when neither was supplied (the update path keeps the
    /// stored image).
    async fn image(&self, state: &AppState) -> Result<Option<(String, ImageKind)>, ApiError> {
        if let Some(url) = &self.image_url {
            if !url.starts_with("https://") {
                return Err(ApiError::Validation("Image URL must use HTTPS".into()));
            }
            return Ok(Some((url.clone(), ImageKind::Url)));
        }
        if let Some((extension, data)) = &self.upload {
            let path = store_upload(&state.config.upload_dir, extension.as_deref(), data).await?;
            return Ok(Some((path, ImageKind::Upload)));
        }
        Ok(None)
    }
}

fn required_text(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart field: {e}")))
}

async fn store_upload(
    upload_dir: &str,
    extension: Option<&str>,
    data: &Bytes,
) -> Result<String, ApiError> {
    let file_name = match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };
    let path = std::path::Path::new(upload_dir).join(&file_name);
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(format!("/uploads/{file_name}"))
}
